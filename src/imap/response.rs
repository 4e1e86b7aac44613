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

//! The server responses and their wire format.

use std::io::{self, Write};

use chrono::prelude::*;

use super::lex::LexWriter;
use crate::mime::fetch::bodystructure::BodyStructure;
use crate::mime::fetch::envelope::Envelope;
use crate::store::model::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// The final response to a command: `tag OK/NO/BAD [code] text`.
    Tagged(String, Status),
    /// `* OK/NO/BAD [code] text`
    Untagged(Status),
    /// `* BYE text`
    Bye(String),
    /// `+ text`
    Continuation(String),
    /// `* <data>`
    Data(Data),
}

/// The untagged data responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Data {
    Capability(Vec<String>),
    Enabled(Vec<String>),
    Exists(u32),
    Recent(u32),
    Expunge(u32),
    Flags(Vec<Flag>),
    List {
        lsub: bool,
        attributes: Vec<String>,
        delimiter: String,
        name: String,
    },
    Status {
        mailbox: String,
        items: Vec<(StatusItem, u32)>,
    },
    Search(Vec<u32>),
    Namespace(Namespaces),
    QuotaRoot {
        mailbox: String,
        roots: Vec<String>,
    },
    Quota(Quota),
    Acl {
        mailbox: String,
        entries: Vec<AclEntry>,
    },
    ListRights {
        mailbox: String,
        identifier: String,
        rights: ListRights,
    },
    MyRights {
        mailbox: String,
        rights: String,
    },
    Fetch {
        seq: u32,
        attrs: Vec<FetchAttr>,
    },
}

/// One rendered item within a `FETCH` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchAttr {
    Flags(FlagSet),
    InternalDate(DateTime<FixedOffset>),
    Rfc822Size(u64),
    Uid(Uid),
    Envelope(Box<Envelope>),
    /// `BODY` or `BODYSTRUCTURE`; the flag selects the name.
    BodyStructure(bool, Box<BodyStructure>),
    /// Section content, e.g. `BODY[TEXT] {n}\r\n...`. Always sent as a
    /// literal, even when empty.
    Section(String, Vec<u8>),
}

impl Response {
    /// Serialises the response, including the line ending.
    pub fn write_to(
        &self,
        out: &mut impl Write,
        unicode_aware: bool,
    ) -> io::Result<()> {
        let mut lex = LexWriter::new(out, unicode_aware);
        match *self {
            Response::Tagged(ref tag, ref status) => {
                lex.verbatim(tag)?;
                lex.verbatim(" ")?;
                write_status(&mut lex, status)?;
            },
            Response::Untagged(ref status) => {
                lex.verbatim("* ")?;
                write_status(&mut lex, status)?;
            },
            Response::Bye(ref text) => {
                lex.verbatim("* BYE ")?;
                lex.verbatim(text)?;
            },
            Response::Continuation(ref text) => {
                lex.verbatim("+ ")?;
                lex.verbatim(text)?;
            },
            Response::Data(ref data) => {
                lex.verbatim("* ")?;
                data.write_to(&mut lex)?;
            },
        }
        lex.verbatim("\r\n")
    }

    pub fn to_bytes(&self, unicode_aware: bool) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut out, unicode_aware);
        out
    }
}

fn write_status<W: Write>(
    lex: &mut LexWriter<W>,
    status: &Status,
) -> io::Result<()> {
    lex.verbatim(status.cond.name())?;
    if let Some(ref code) = status.code {
        lex.verbatim(" [")?;
        lex.verbatim(code)?;
        lex.verbatim("]")?;
    }
    lex.verbatim(" ")?;
    lex.verbatim(&status.text)
}

fn write_words<W: Write>(
    lex: &mut LexWriter<W>,
    words: &[String],
) -> io::Result<()> {
    for word in words {
        lex.verbatim(" ")?;
        lex.verbatim(word)?;
    }
    Ok(())
}

fn write_namespaces<W: Write>(
    lex: &mut LexWriter<W>,
    namespaces: &[Namespace],
) -> io::Result<()> {
    if namespaces.is_empty() {
        return lex.nil();
    }

    lex.verbatim("(")?;
    for ns in namespaces {
        lex.verbatim("(")?;
        lex.string(&ns.prefix)?;
        lex.verbatim(" ")?;
        lex.string(&ns.delimiter)?;
        lex.verbatim(")")?;
    }
    lex.verbatim(")")
}

impl Data {
    fn write_to<W: Write>(&self, lex: &mut LexWriter<W>) -> io::Result<()> {
        match *self {
            Data::Capability(ref caps) => {
                lex.verbatim("CAPABILITY")?;
                write_words(lex, caps)?;
            },
            Data::Enabled(ref caps) => {
                lex.verbatim("ENABLED")?;
                write_words(lex, caps)?;
            },
            Data::Exists(n) => {
                lex.num_u32(n)?;
                lex.verbatim(" EXISTS")?;
            },
            Data::Recent(n) => {
                lex.num_u32(n)?;
                lex.verbatim(" RECENT")?;
            },
            Data::Expunge(n) => {
                lex.num_u32(n)?;
                lex.verbatim(" EXPUNGE")?;
            },
            Data::Flags(ref flags) => {
                lex.verbatim("FLAGS ")?;
                lex.flags(flags)?;
            },
            Data::List {
                lsub,
                ref attributes,
                ref delimiter,
                ref name,
            } => {
                lex.verbatim(if lsub { "LSUB (" } else { "LIST (" })?;
                lex.verbatim(&attributes.join(" "))?;
                lex.verbatim(") ")?;
                lex.string(delimiter)?;
                lex.verbatim(" ")?;
                lex.mailbox(name)?;
            },
            Data::Status {
                ref mailbox,
                ref items,
            } => {
                lex.verbatim("STATUS ")?;
                lex.mailbox(mailbox)?;
                lex.verbatim(" (")?;
                for (ix, &(item, value)) in items.iter().enumerate() {
                    if ix > 0 {
                        lex.verbatim(" ")?;
                    }
                    lex.verbatim(item.name())?;
                    lex.verbatim(" ")?;
                    lex.num_u32(value)?;
                }
                lex.verbatim(")")?;
            },
            Data::Search(ref hits) => {
                lex.verbatim("SEARCH")?;
                for &hit in hits {
                    lex.verbatim(" ")?;
                    lex.num_u32(hit)?;
                }
            },
            Data::Namespace(ref ns) => {
                lex.verbatim("NAMESPACE ")?;
                write_namespaces(lex, &ns.personal)?;
                lex.verbatim(" ")?;
                write_namespaces(lex, &ns.other_users)?;
                lex.verbatim(" ")?;
                write_namespaces(lex, &ns.shared)?;
            },
            Data::QuotaRoot {
                ref mailbox,
                ref roots,
            } => {
                lex.verbatim("QUOTAROOT ")?;
                lex.mailbox(mailbox)?;
                for root in roots {
                    lex.verbatim(" ")?;
                    lex.string(root)?;
                }
            },
            Data::Quota(ref quota) => {
                lex.verbatim("QUOTA ")?;
                lex.string(&quota.root)?;
                lex.verbatim(" (")?;
                for (ix, res) in quota.resources.iter().enumerate() {
                    if ix > 0 {
                        lex.verbatim(" ")?;
                    }
                    lex.verbatim(&res.name)?;
                    lex.verbatim(" ")?;
                    lex.num_u64(res.usage)?;
                    lex.verbatim(" ")?;
                    lex.num_u64(res.limit)?;
                }
                lex.verbatim(")")?;
            },
            Data::Acl {
                ref mailbox,
                ref entries,
            } => {
                lex.verbatim("ACL ")?;
                lex.mailbox(mailbox)?;
                for entry in entries {
                    lex.verbatim(" ")?;
                    lex.string(&entry.identifier)?;
                    lex.verbatim(" ")?;
                    lex.string(&entry.rights)?;
                }
            },
            Data::ListRights {
                ref mailbox,
                ref identifier,
                ref rights,
            } => {
                lex.verbatim("LISTRIGHTS ")?;
                lex.mailbox(mailbox)?;
                lex.verbatim(" ")?;
                lex.string(identifier)?;
                lex.verbatim(" ")?;
                lex.string(&rights.required)?;
                for optional in &rights.optional {
                    lex.verbatim(" ")?;
                    lex.astring(optional)?;
                }
            },
            Data::MyRights {
                ref mailbox,
                ref rights,
            } => {
                lex.verbatim("MYRIGHTS ")?;
                lex.quoted_mailbox(mailbox)?;
                lex.verbatim(" ")?;
                lex.string(rights)?;
            },
            Data::Fetch { seq, ref attrs } => {
                lex.num_u32(seq)?;
                lex.verbatim(" FETCH (")?;
                for (ix, attr) in attrs.iter().enumerate() {
                    if ix > 0 {
                        lex.verbatim(" ")?;
                    }
                    attr.write_to(lex)?;
                }
                lex.verbatim(")")?;
            },
        }

        Ok(())
    }
}

impl FetchAttr {
    fn write_to<W: Write>(&self, lex: &mut LexWriter<W>) -> io::Result<()> {
        match *self {
            FetchAttr::Flags(ref flags) => {
                lex.verbatim("FLAGS ")?;
                lex.flags(flags)
            },
            FetchAttr::InternalDate(ref date) => {
                lex.verbatim("INTERNALDATE ")?;
                lex.datetime(date)
            },
            FetchAttr::Rfc822Size(size) => {
                lex.verbatim("RFC822.SIZE ")?;
                lex.num_u64(size)
            },
            FetchAttr::Uid(uid) => {
                lex.verbatim("UID ")?;
                lex.num_u32(uid.get())
            },
            FetchAttr::Envelope(ref envelope) => {
                lex.verbatim("ENVELOPE ")?;
                envelope.write_to(lex)
            },
            FetchAttr::BodyStructure(extended, ref bs) => {
                lex.verbatim(if extended { "BODYSTRUCTURE " } else { "BODY " })?;
                bs.write_to(lex)
            },
            FetchAttr::Section(ref name, ref data) => {
                lex.verbatim(name)?;
                lex.verbatim(" ")?;
                lex.literal(data)
            },
        }
    }
}
