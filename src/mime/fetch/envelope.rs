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

use std::io::{self, Write};

use crate::imap::lex::LexWriter;

/// The `ENVELOPE` structure defined by RFC 3501, in the order the fields are
/// to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// The `Date` header.
    pub date: Option<String>,
    /// The `Subject` header, decoded.
    pub subject: Option<String>,
    /// The `From` header, decoded.
    pub from: Vec<EnvelopeAddress>,
    /// The `Sender` header, decoded.
    ///
    /// If empty, `from` is sent in its place.
    pub sender: Vec<EnvelopeAddress>,
    /// The `Reply-To` header, decoded.
    ///
    /// If empty, `from` is sent in its place.
    pub reply_to: Vec<EnvelopeAddress>,
    pub to: Vec<EnvelopeAddress>,
    pub cc: Vec<EnvelopeAddress>,
    pub bcc: Vec<EnvelopeAddress>,
    /// The `In-Reply-To` header, trimmed.
    pub in_reply_to: Option<String>,
    /// The `Message-ID` header, trimmed.
    pub message_id: Option<String>,
}

/// Representation of an email address, or a group fragment, in an RFC 3501
/// `ENVELOPE`.
///
/// Groups are encoded with delimiters: a group is started with an "address"
/// with a name but no domain, and terminated with an "address" with neither
/// local part nor domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeAddress {
    /// The display name if present, decoded.
    pub name: Option<String>,
    /// The obsolete RFC 822 source route, almost always absent.
    pub routing: Option<String>,
    /// The local part of the address (RFC 3501's "mailbox name").
    ///
    /// If `None` and `domain` is also `None`, this is a group-end delimiter.
    pub local: Option<String>,
    /// The domain of the address (RFC 3501's "host name").
    ///
    /// If `None` and `local` is set, this is a group-start delimiter and
    /// `local` is the group name.
    pub domain: Option<String>,
}

impl EnvelopeAddress {
    pub fn new(name: Option<&str>, local: &str, domain: &str) -> Self {
        EnvelopeAddress {
            name: name.map(str::to_owned),
            routing: None,
            local: Some(local.to_owned()),
            domain: Some(domain.to_owned()),
        }
    }
}

impl Envelope {
    /// Writes the parenthesised `ENVELOPE` value.
    pub fn write_to<W: Write>(&self, lex: &mut LexWriter<W>) -> io::Result<()> {
        lex.verbatim("(")?;
        lex.censored_nstring(&self.date)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&self.subject)?;
        lex.verbatim(" ")?;
        write_addresses(lex, &self.from)?;
        lex.verbatim(" ")?;
        write_addresses(
            lex,
            if self.sender.is_empty() {
                &self.from
            } else {
                &self.sender
            },
        )?;
        lex.verbatim(" ")?;
        write_addresses(
            lex,
            if self.reply_to.is_empty() {
                &self.from
            } else {
                &self.reply_to
            },
        )?;
        lex.verbatim(" ")?;
        write_addresses(lex, &self.to)?;
        lex.verbatim(" ")?;
        write_addresses(lex, &self.cc)?;
        lex.verbatim(" ")?;
        write_addresses(lex, &self.bcc)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&self.in_reply_to)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&self.message_id)?;
        lex.verbatim(")")
    }
}

fn write_addresses<W: Write>(
    lex: &mut LexWriter<W>,
    addresses: &[EnvelopeAddress],
) -> io::Result<()> {
    if addresses.is_empty() {
        return lex.nil();
    }

    lex.verbatim("(")?;
    for address in addresses {
        lex.verbatim("(")?;
        lex.censored_nstring(&address.name)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&address.routing)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&address.local)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&address.domain)?;
        lex.verbatim(")")?;
    }
    lex.verbatim(")")
}
