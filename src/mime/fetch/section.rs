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

//! ## Regarding message layout
//!
//! IMAP defines a mechanism to access parts of a message based on its
//! multipart hierarchy. Each part of a multipart is assigned a number,
//! starting at 1. Parts can be addressed by multiple subscripts, such that,
//! e.g., `2.3` is the third sub-part of the second part.
//!
//! IMAP also allows traversing `message/rfc822` parts by this mechanism: a
//! subscript applied to such a part addresses the parts of the message it
//! encapsulates. A non-multipart entity has exactly one part, itself, so
//! subscript `1` on a plain message refers to its content.
//!
//! After zero or more subscripts, we get a final subsection specifier. This
//! can be one of:
//!
//! - Nothing. At top level, this fetches the whole message. For any other
//!   part, it fetches the part content.
//!
//! - `HEADER`. At top level, this fetches the header. For any other part, it
//!   ignores the actual header and instead fetches the header of an embedded
//!   `message/rfc822` part. This specifier also allows filtering headers based
//!   on a whitelist (`HEADER.FIELDS`) or blacklist (`HEADER.FIELDS.NOT`).
//!
//! - `MIME`. For any part other than the top level, it fetches the header of
//!   the part. At top level it is treated like `HEADER`.
//!
//! - `TEXT`. At top level, this fetches the content of the message. For any
//!   other part, fetches the content of an embedded `message/rfc822` part.
//!
//! Every variant which returns a header includes the blank line that
//! separates the header from the content.

use std::fmt;

use crate::mime::{Body, Entity};

/// Describes which portion of a part to process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LeafType {
    /// The whole message at top level, the content otherwise.
    Full,
    /// The header of the message, or of the embedded message.
    Headers,
    /// The header of the part itself.
    Mime,
    /// The content of the message, or of the embedded message.
    Text,
}

/// The RFC 1730 names for the whole-message sections, which are reported
/// under their own names rather than as `BODY[...]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Imap2Section {
    Rfc822,
    Rfc822Header,
    Rfc822Text,
}

impl Imap2Section {
    pub fn name(self) -> &'static str {
        match self {
            Imap2Section::Rfc822 => "RFC822",
            Imap2Section::Rfc822Header => "RFC822.HEADER",
            Imap2Section::Rfc822Text => "RFC822.TEXT",
        }
    }
}

/// Identifies a particular portion of the body to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodySection {
    /// Which subscripts to traverse to find the part in question.
    pub subscripts: Vec<u32>,
    /// Which subsection of the part to read.
    pub leaf_type: LeafType,
    /// Apply filtering to these header names.
    pub header_filter: Vec<String>,
    /// If true, discard headers matching `header_filter`.
    ///
    /// If false and `header_filter` is non-empty, keep only headers matching
    /// that filter.
    pub discard_matching_headers: bool,
    /// If set, the offset and optional maximum length of the slice of the
    /// section to return.
    pub partial: Option<(u64, Option<u64>)>,
    /// If set, report the section under this legacy name.
    pub report_as_legacy: Option<Imap2Section>,
}

impl Default for BodySection {
    fn default() -> Self {
        BodySection {
            subscripts: vec![],
            leaf_type: LeafType::Full,
            header_filter: vec![],
            discard_matching_headers: false,
            partial: None,
            report_as_legacy: None,
        }
    }
}

impl BodySection {
    /// Whether the header filter selects a field with the given name.
    fn keep_header(&self, name: &str) -> bool {
        if LeafType::Headers != self.leaf_type
            || (self.header_filter.is_empty() && !self.discard_matching_headers)
        {
            return true;
        }

        let matches = self
            .header_filter
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name));
        matches != self.discard_matching_headers
    }

    /// Extracts the section from `message`, ignoring `partial`.
    ///
    /// Returns `None` if the subscripts do not address an existing part.
    pub fn extract(&self, message: &Entity) -> Option<Vec<u8>> {
        let mut part = message;
        for &subscript in &self.subscripts {
            part = subpart(part, subscript)?;
        }

        let top_level = self.subscripts.is_empty();
        let embedded = match part.body {
            Body::Message(ref embedded) if !top_level => embedded,
            _ => part,
        };

        Some(match self.leaf_type {
            LeafType::Full if top_level => part.full_bytes(),
            LeafType::Full => part.content.clone(),
            LeafType::Text => embedded.content.clone(),
            LeafType::Mime if !top_level => self.header_of(part),
            LeafType::Mime | LeafType::Headers => self.header_of(embedded),
        })
    }

    /// Extracts the section and applies `partial`.
    pub fn fetch(&self, message: &Entity) -> Vec<u8> {
        let data = self.extract(message).unwrap_or_default();
        match self.partial {
            None => data,
            Some((offset, count)) => {
                let len = data.len() as u64;
                if offset >= len {
                    Vec::new()
                } else {
                    let end = count
                        .map_or(len, |count| offset.saturating_add(count).min(len));
                    data[offset as usize..end as usize].to_vec()
                }
            },
        }
    }

    fn header_of(&self, entity: &Entity) -> Vec<u8> {
        let mut out = Vec::new();
        for field in &entity.header {
            if self.keep_header(&field.name) {
                out.extend_from_slice(&field.raw);
            }
        }
        out.extend_from_slice(b"\r\n");
        out
    }

    /// The name under which the fetched section is reported, e.g.
    /// `BODY[1.HEADER.FIELDS (From To)]<0>`.
    pub fn response_name(&self) -> String {
        if let Some(legacy) = self.report_as_legacy {
            return legacy.name().to_owned();
        }

        let mut name = format!("BODY[{}]", self);
        if let Some((offset, _)) = self.partial {
            name.push_str(&format!("<{}>", offset));
        }
        name
    }
}

impl fmt::Display for BodySection {
    /// Formats the part between the brackets of `BODY[...]`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ix, subscript) in self.subscripts.iter().enumerate() {
            if ix > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", subscript)?;
        }

        let leaf = match self.leaf_type {
            LeafType::Full => return Ok(()),
            LeafType::Headers if self.discard_matching_headers => {
                "HEADER.FIELDS.NOT"
            },
            LeafType::Headers if !self.header_filter.is_empty() => {
                "HEADER.FIELDS"
            },
            LeafType::Headers => "HEADER",
            LeafType::Mime => "MIME",
            LeafType::Text => "TEXT",
        };

        if !self.subscripts.is_empty() {
            write!(f, ".")?;
        }
        write!(f, "{}", leaf)?;

        if LeafType::Headers == self.leaf_type
            && (self.discard_matching_headers || !self.header_filter.is_empty())
        {
            write!(f, " ({})", self.header_filter.join(" "))?;
        }

        Ok(())
    }
}

fn subpart(entity: &Entity, subscript: u32) -> Option<&Entity> {
    let index = subscript.checked_sub(1)? as usize;
    match entity.body {
        Body::Multipart(ref children) => children.get(index),
        Body::Message(ref embedded) => match embedded.body {
            Body::Multipart(ref children) => children.get(index),
            _ if 0 == index => Some(embedded),
            _ => None,
        },
        Body::Single if 0 == index => Some(entity),
        Body::Single => None,
    }
}
