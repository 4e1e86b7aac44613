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

//! The already-parsed message model consumed by `FETCH`.
//!
//! Parsing MIME is the store's job. It hands the engine an `Entity` tree in
//! which every node keeps its header fields in raw form (so header sections
//! can be returned byte-for-byte) alongside the few decoded values the
//! structure rendering needs.

pub mod fetch;
pub mod utf7;

use self::fetch::envelope::Envelope;

/// One header field of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderField {
    /// The field name, as it appears in the message.
    pub name: String,
    /// The unfolded value, without leading whitespace.
    pub value: String,
    /// The exact bytes of the field, including the terminating line ending.
    pub raw: Vec<u8>,
}

impl HeaderField {
    /// Builds a field from a name and a single-line value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        let raw = format!("{}: {}\r\n", name, value).into_bytes();
        HeaderField { name, value, raw }
    }
}

/// A content type and its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    pub media_type: String,
    pub subtype: String,
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    pub fn new(media_type: &str, subtype: &str) -> Self {
        ContentType {
            media_type: media_type.to_owned(),
            subtype: subtype.to_owned(),
            parameters: vec![],
        }
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn is_type(&self, media_type: &str) -> bool {
        self.media_type.eq_ignore_ascii_case(media_type)
    }

    pub fn is(&self, media_type: &str, subtype: &str) -> bool {
        self.is_type(media_type) && self.subtype.eq_ignore_ascii_case(subtype)
    }
}

impl Default for ContentType {
    /// The RFC 2045 default, `text/plain; charset=us-ascii`.
    fn default() -> Self {
        ContentType::new("text", "plain").with_parameter("charset", "us-ascii")
    }
}

/// What an entity's content consists of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// Opaque content.
    Single,
    /// A `multipart/*` entity and its parts, in order.
    Multipart(Vec<Entity>),
    /// A `message/rfc822` entity and the message it encapsulates.
    Message(Box<Entity>),
}

/// A message, or one part of one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub header: Vec<HeaderField>,
    pub content_type: ContentType,
    pub content_id: Option<String>,
    pub content_description: Option<String>,
    pub content_transfer_encoding: Option<String>,
    /// The content of the entity in transfer-encoded form. For multiparts and
    /// embedded messages, this is the full text of everything after the
    /// header block.
    pub content: Vec<u8>,
    pub body: Body,
    /// The envelope derived from this entity's header. Only meaningful for
    /// the top-level message and for messages embedded in `message/rfc822`
    /// parts.
    pub envelope: Envelope,
}

impl Entity {
    /// Builds an entity from its header and content, taking the
    /// `Content-ID`, `Content-Description` and `Content-Transfer-Encoding`
    /// values from the header.
    pub fn new(
        header: Vec<HeaderField>,
        content_type: ContentType,
        content: Vec<u8>,
        body: Body,
    ) -> Self {
        let lookup = |name: &str| {
            header
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(name))
                .map(|f| f.value.trim().to_owned())
        };

        Entity {
            content_id: lookup("Content-ID"),
            content_description: lookup("Content-Description"),
            content_transfer_encoding: lookup("Content-Transfer-Encoding"),
            header,
            content_type,
            content,
            body,
            envelope: Envelope::default(),
        }
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// The raw header block, not including the blank separator line.
    pub fn header_bytes(&self) -> Vec<u8> {
        self.header.iter().flat_map(|f| f.raw.iter().copied()).collect()
    }

    /// The full text of the entity: header, blank line, and content.
    pub fn full_bytes(&self) -> Vec<u8> {
        let mut out = self.header_bytes();
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.content);
        out
    }

    /// The number of lines in the encoded content.
    pub fn line_count(&self) -> u64 {
        let newlines = memchr::memchr_iter(b'\n', &self.content).count() as u64;
        match self.content.last() {
            None | Some(b'\n') => newlines,
            Some(_) => newlines + 1,
        }
    }
}
