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

//! Utilities for *writing* values under IMAP's "lexical rules".
//!
//! This is write-only since IMAP's lexical syntax is not separable from its
//! grammar.
//!
//! # Encoding Decisions
//!
//! We're generally pretty conservative here.
//!
//! Given the choice between encoding a string as an atom-like value or some
//! other form, we only use atom if all characters are in the set
//! `a-zA-Z0-9?=+/_.-` and the string is not "NIL".
//!
//! Given the choice between encoding a string as a quoted string or a literal,
//! we only choose the quoted string if it only contains characters other than
//! controls, backslash, double-quote, is less than 100 bytes long, and if the
//! session is not in UTF-8 mode, non-ASCII characters.
//!
//! Header-derived text (envelope fields, body parameters) is sent as-is once
//! the client has enabled `UTF8=ACCEPT`. Before that, non-ASCII characters in
//! it are replaced with `X`, since there is no standard way to represent them.

use std::borrow::Cow;
use std::io::{self, Write};

use chrono::prelude::*;

use super::mailbox_name;
use crate::store::model::Flag;

#[derive(Clone, Copy, Debug)]
pub struct LexWriter<W> {
    writer: W,
    unicode_aware: bool,
}

impl<W: Write> LexWriter<W> {
    pub fn new(writer: W, unicode_aware: bool) -> Self {
        LexWriter {
            writer,
            unicode_aware,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn verbatim(&mut self, s: &str) -> io::Result<()> {
        self.writer.write_all(s.as_bytes())
    }

    pub fn verbatim_bytes(&mut self, s: &[u8]) -> io::Result<()> {
        self.writer.write_all(s)
    }

    pub fn nil(&mut self) -> io::Result<()> {
        self.verbatim("NIL")
    }

    /// Writes a mailbox name, converting it to modified UTF-7 unless the
    /// client accepts UTF-8.
    pub fn mailbox(&mut self, name: &str) -> io::Result<()> {
        let wire = mailbox_name::to_wire(name, self.unicode_aware);
        self.astring(&wire)
    }

    /// Like `mailbox`, but always as a string, never an atom.
    pub fn quoted_mailbox(&mut self, name: &str) -> io::Result<()> {
        let wire = mailbox_name::to_wire(name, self.unicode_aware);
        self.string(&wire)
    }

    pub fn censored_nstring(
        &mut self,
        s: &Option<impl AsRef<str>>,
    ) -> io::Result<()> {
        match s.as_ref() {
            None => self.nil(),
            Some(s) => self.string(&self.censor(s.as_ref())),
        }
    }

    pub fn censored_string(&mut self, s: &str) -> io::Result<()> {
        self.string(&self.censor(s))
    }

    pub fn literal(&mut self, data: &[u8]) -> io::Result<()> {
        write!(self.writer, "{{{}}}\r\n", data.len())?;
        self.writer.write_all(data)
    }

    pub fn flag(&mut self, flag: &Flag) -> io::Result<()> {
        write!(self.writer, "{}", flag)
    }

    /// Writes a parenthesised, space-separated flag list.
    pub fn flags<'a>(
        &mut self,
        flags: impl IntoIterator<Item = &'a Flag>,
    ) -> io::Result<()> {
        self.verbatim("(")?;
        for (ix, flag) in flags.into_iter().enumerate() {
            if ix > 0 {
                self.verbatim(" ")?;
            }
            self.flag(flag)?;
        }
        self.verbatim(")")
    }

    pub fn datetime(
        &mut self,
        datetime: &DateTime<FixedOffset>,
    ) -> io::Result<()> {
        write!(
            self.writer,
            "\"{}\"",
            datetime.format("%d-%b-%Y %H:%M:%S %z")
        )
    }

    pub fn num_u32(&mut self, value: u32) -> io::Result<()> {
        write!(self.writer, "{}", value)
    }

    pub fn num_u64(&mut self, value: u64) -> io::Result<()> {
        write!(self.writer, "{}", value)
    }

    pub fn astring(&mut self, s: &str) -> io::Result<()> {
        if self.is_conservative_atom(s) {
            write!(self.writer, "{}", s)
        } else {
            self.string(s)
        }
    }

    /// Writes `s` as a quoted string if possible, otherwise as a literal.
    pub fn string(&mut self, s: &str) -> io::Result<()> {
        if self.is_quotable(s) {
            write!(self.writer, "\"{}\"", s)
        } else {
            self.literal(s.as_bytes())
        }
    }

    pub fn nstring(&mut self, s: &Option<impl AsRef<str>>) -> io::Result<()> {
        match s.as_ref() {
            None => self.nil(),
            Some(s) => self.string(s.as_ref()),
        }
    }

    fn censor<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if self.unicode_aware || s.is_ascii() {
            Cow::Borrowed(s)
        } else {
            Cow::Owned(s.replace(|ch| ch > '\u{7f}', "X"))
        }
    }

    fn is_conservative_atom(&self, s: &str) -> bool {
        !"nil".eq_ignore_ascii_case(s)
            && !s.is_empty()
            && s.as_bytes().iter().copied().all(|b| {
                matches!(
                    b,
                    b'a'..=b'z'
                        | b'A'..=b'Z'
                        | b'0'..=b'9'
                        | b'='
                        | b'?'
                        | b'/'
                        | b'+'
                        | b'_'
                        | b'.'
                        | b'-'
                )
            })
    }

    fn is_quotable(&self, s: &str) -> bool {
        s.len() < 100
            && s.as_bytes().iter().copied().all(|b| match b {
                0..=31 | 127 | b'\\' | b'"' => false,
                128..=255 => self.unicode_aware,
                _ => true,
            })
    }
}
