//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Crymap.
//
// Crymap is free software: you can  redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Crymap is distributed  in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Crymap. If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use std::str::FromStr;

use crate::support::error::Error;

/// One endpoint of a sequence-set range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bound {
    Number(u32),
    /// `*`, the largest number in use.
    Star,
}

impl Bound {
    fn resolve(self, star: u32) -> u32 {
        match self {
            Bound::Number(n) => n,
            Bound::Star => star,
        }
    }
}

/// A parsed IMAP `sequence-set`, such as `2:4,7,9:*`.
///
/// `*` is kept symbolic so the same set can be evaluated against sequence
/// numbers or UIDs, whose maxima differ.
#[derive(Clone, PartialEq, Eq)]
pub struct SequenceSet {
    ranges: Vec<(Bound, Bound)>,
}

impl SequenceSet {
    /// Returns whether `value` is in the set, taking `*` to mean `star`.
    ///
    /// RFC 3501 allows the endpoints to be in either order for some reason,
    /// so each range is normalised before testing. This also makes `n:*`
    /// with `n` beyond the largest value match the largest value.
    pub fn contains(&self, value: u32, star: u32) -> bool {
        self.ranges.iter().any(|&(a, b)| {
            let (a, b) = (a.resolve(star), b.resolve(star));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            value >= lo && value <= hi
        })
    }

    /// Evaluates the set against `1..=max`, returning the members in
    /// ascending order without duplicates.
    #[cfg(test)]
    pub fn items(&self, max: u32) -> Vec<u32> {
        (1..=max).filter(|&v| self.contains(v, max)).collect()
    }
}

impl FromStr for SequenceSet {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        fn bound(s: &str) -> Result<Bound, Error> {
            if "*" == s {
                Ok(Bound::Star)
            } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                match s.parse::<u32>() {
                    Ok(0) | Err(_) => Err(Error::BadSequenceSet),
                    Ok(n) => Ok(Bound::Number(n)),
                }
            } else {
                Err(Error::BadSequenceSet)
            }
        }

        let mut ranges = Vec::new();
        for part in raw.split(',') {
            let mut it = part.splitn(2, ':');
            let start = bound(it.next().unwrap_or(""))?;
            let end = match it.next() {
                Some(end) => bound(end)?,
                None => start,
            };
            ranges.push((start, end));
        }

        Ok(SequenceSet { ranges })
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_bound(f: &mut fmt::Formatter, b: Bound) -> fmt::Result {
            match b {
                Bound::Number(n) => write!(f, "{}", n),
                Bound::Star => write!(f, "*"),
            }
        }

        for (ix, &(start, end)) in self.ranges.iter().enumerate() {
            if ix > 0 {
                write!(f, ",")?;
            }
            write_bound(f, start)?;
            if start != end {
                write!(f, ":")?;
                write_bound(f, end)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self)
    }
}
