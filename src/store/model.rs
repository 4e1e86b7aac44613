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

use std::convert::TryFrom;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::prelude::*;

use crate::support::error::Error;

/// A message unique identifier.
///
/// UIDs are strictly ascending within one UID validity of a mailbox, so the
/// order of a mailbox listing by UID is also its sequence number order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uid({})", self.0.get())
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

impl Uid {
    pub const MIN: Self = Uid(match NonZeroU32::new(1) {
        Some(v) => v,
        None => unreachable!(),
    });

    pub fn of(uid: u32) -> Option<Self> {
        NonZeroU32::new(uid).map(Uid)
    }

    #[cfg(test)]
    pub fn u(uid: u32) -> Self {
        Uid::of(uid).unwrap()
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn next(self) -> Option<Self> {
        self.0.get().checked_add(1).and_then(Uid::of)
    }
}

impl TryFrom<u32> for Uid {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Uid::of(v).ok_or(())
    }
}

impl From<Uid> for u32 {
    fn from(uid: Uid) -> u32 {
        uid.0.get()
    }
}

/// A message flag.
///
/// System flags carry the leading backslash when rendered; keywords are
/// rendered verbatim. Keywords compare ASCII case-insensitively.
#[derive(Clone)]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Recent,
    Seen,
    Keyword(String),
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Recent => write!(f, "\\Recent"),
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Keyword(ref kw) => write!(f, "{}", kw),
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Flag as fmt::Display>::fmt(self, f)
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("\\answered") {
            Ok(Flag::Answered)
        } else if s.eq_ignore_ascii_case("\\deleted") {
            Ok(Flag::Deleted)
        } else if s.eq_ignore_ascii_case("\\draft") {
            Ok(Flag::Draft)
        } else if s.eq_ignore_ascii_case("\\flagged") {
            Ok(Flag::Flagged)
        } else if s.eq_ignore_ascii_case("\\recent") {
            Ok(Flag::Recent)
        } else if s.eq_ignore_ascii_case("\\seen") {
            Ok(Flag::Seen)
        } else if s.starts_with('\\') {
            Err(Error::UnknownFlag)
        } else if !s.is_empty() && s.as_bytes().iter().copied().all(is_atom_char)
        {
            Ok(Flag::Keyword(s.to_owned()))
        } else {
            Err(Error::UnsafeName)
        }
    }
}

fn is_atom_char(ch: u8) -> bool {
    match ch {
        0..=b' ' => false,
        127..=255 => false,
        b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' | b']' => false,
        _ => true,
    }
}

impl PartialEq for Flag {
    fn eq(&self, other: &Flag) -> bool {
        match (self, other) {
            (&Flag::Answered, &Flag::Answered) => true,
            (&Flag::Deleted, &Flag::Deleted) => true,
            (&Flag::Draft, &Flag::Draft) => true,
            (&Flag::Flagged, &Flag::Flagged) => true,
            (&Flag::Recent, &Flag::Recent) => true,
            (&Flag::Seen, &Flag::Seen) => true,
            (&Flag::Keyword(ref a), &Flag::Keyword(ref b)) => {
                a.eq_ignore_ascii_case(b)
            },
            _ => false,
        }
    }
}

impl Eq for Flag {}

/// An immutable set of flags, kept in first-insertion order so that
/// responses list flags stably.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagSet(Vec<Flag>);

impl FlagSet {
    pub fn new() -> Self {
        FlagSet(Vec::new())
    }

    pub fn contains(&self, flag: &Flag) -> bool {
        self.0.contains(flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the set of flags in either `self` or `other`.
    pub fn union<'a>(&self, other: impl IntoIterator<Item = &'a Flag>) -> Self {
        let mut out = self.clone();
        for flag in other {
            if !out.contains(flag) {
                out.0.push(flag.clone());
            }
        }
        out
    }

    /// Returns the set of flags in `self` but not in `other`.
    pub fn difference<'a>(
        &self,
        other: impl IntoIterator<Item = &'a Flag>,
    ) -> Self {
        let other = other.into_iter().collect::<Vec<_>>();
        FlagSet(
            self.0
                .iter()
                .filter(|f| !other.contains(f))
                .cloned()
                .collect(),
        )
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Flag>>(it: I) -> Self {
        let mut out = FlagSet::new();
        for flag in it {
            if !out.contains(&flag) {
                out.0.push(flag);
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a Flag;
    type IntoIter = std::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The operator of a `STORE` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Replace,
    Add,
    Remove,
}

impl StoreOp {
    /// Computes the flags a message ends up with when this operation is
    /// applied with `flags` to a message currently flagged with `current`.
    pub fn apply(self, current: &FlagSet, flags: &FlagSet) -> FlagSet {
        match self {
            StoreOp::Replace => flags.clone(),
            StoreOp::Add => current.union(flags),
            StoreOp::Remove => current.difference(flags),
        }
    }
}

/// The condition of a status response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    Ok,
    No,
    Bad,
}

impl Cond {
    pub fn name(self) -> &'static str {
        match self {
            Cond::Ok => "OK",
            Cond::No => "NO",
            Cond::Bad => "BAD",
        }
    }
}

/// A status response: a condition, optional response code and
/// human-readable text.
///
/// Every store operation receives one of these preloaded with the response
/// the engine will send if the store leaves it alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub cond: Cond,
    /// The response code, without brackets, e.g. `TRYCREATE` or
    /// `UIDVALIDITY 42`.
    pub code: Option<String>,
    pub text: String,
}

impl Status {
    pub fn ok(text: impl Into<String>) -> Self {
        Status {
            cond: Cond::Ok,
            code: None,
            text: text.into(),
        }
    }

    pub fn no(text: impl Into<String>) -> Self {
        Status {
            cond: Cond::No,
            code: None,
            text: text.into(),
        }
    }

    pub fn bad(text: impl Into<String>) -> Self {
        Status {
            cond: Cond::Bad,
            code: None,
            text: text.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        Cond::Ok == self.cond
    }
}

/// Metadata of one message in the selected mailbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageInfo {
    /// Opaque identifier assigned by the store. Used to match messages
    /// across resynchronisations.
    pub id: String,
    pub uid: Uid,
    pub flags: FlagSet,
    pub size: u64,
    pub internal_date: DateTime<FixedOffset>,
    /// The 1-based sequence number, assigned by the mailbox index. 0 until
    /// the message has been indexed.
    pub seq_no: u32,
}

impl MessageInfo {
    pub fn new(
        id: impl Into<String>,
        uid: Uid,
        flags: FlagSet,
        size: u64,
        internal_date: DateTime<FixedOffset>,
    ) -> Self {
        MessageInfo {
            id: id.into(),
            uid,
            flags,
            size,
            internal_date,
            seq_no: 0,
        }
    }
}

/// What the store reports about a mailbox on `SELECT`/`EXAMINE`/`STATUS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectResponse {
    /// The flags defined in the mailbox.
    pub flags: Vec<Flag>,
    /// The flags the client may change permanently.
    pub permanent_flags: Vec<Flag>,
    /// Whether the client may create new keywords (`\*`).
    pub new_keywords: bool,
    pub read_only: bool,
    pub uid_validity: u32,
    /// The predicted next UID, if the store knows better than the engine
    /// (which otherwise uses the highest UID plus one).
    pub uid_next: Option<u32>,
}

impl Default for SelectResponse {
    fn default() -> Self {
        SelectResponse {
            flags: vec![
                Flag::Answered,
                Flag::Flagged,
                Flag::Deleted,
                Flag::Seen,
                Flag::Draft,
            ],
            permanent_flags: vec![
                Flag::Answered,
                Flag::Flagged,
                Flag::Deleted,
                Flag::Seen,
                Flag::Draft,
            ],
            new_keywords: true,
            read_only: false,
            uid_validity: 1,
            uid_next: None,
        }
    }
}

/// One mailbox returned by `LIST` or `LSUB`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    /// Name attributes, including the backslash, e.g. `\Noselect`.
    pub attributes: Vec<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub delimiter: String,
}

/// The three namespace classes of RFC 2342.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespaces {
    pub personal: Vec<Namespace>,
    pub other_users: Vec<Namespace>,
    pub shared: Vec<Namespace>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaResource {
    /// E.g. `STORAGE` or `MESSAGE`.
    pub name: String,
    pub usage: u64,
    pub limit: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quota {
    pub root: String,
    pub resources: Vec<QuotaResource>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclEntry {
    pub identifier: String,
    pub rights: String,
}

/// The `LISTRIGHTS` answer for one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRights {
    /// Rights always granted.
    pub required: String,
    /// Groups of rights that may be granted, each rendered as one item.
    pub optional: Vec<String>,
}

/// How `SETACL` applies its rights string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AclModify {
    Replace,
    Add,
    Remove,
}

/// How much of a message the engine needs for a `FETCH`.
///
/// Lets the store avoid loading bodies when only headers or structure are
/// wanted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FetchScope {
    Header,
    Structure,
    Full,
}

/// The `STATUS` data items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusItem {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
}

impl StatusItem {
    pub fn name(self) -> &'static str {
        match self {
            StatusItem::Messages => "MESSAGES",
            StatusItem::Recent => "RECENT",
            StatusItem::UidNext => "UIDNEXT",
            StatusItem::UidValidity => "UIDVALIDITY",
            StatusItem::Unseen => "UNSEEN",
        }
    }
}

impl FromStr for StatusItem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        [
            StatusItem::Messages,
            StatusItem::Recent,
            StatusItem::UidNext,
            StatusItem::UidValidity,
            StatusItem::Unseen,
        ]
        .iter()
        .copied()
        .find(|item| item.name().eq_ignore_ascii_case(s))
        .ok_or(())
    }
}
