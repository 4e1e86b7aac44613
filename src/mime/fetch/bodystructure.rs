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

use super::envelope::Envelope;
use crate::imap::lex::LexWriter;
use crate::mime::{Body, Entity};

/// The RFC 3501 `BODYSTRUCTURE` structure, restricted to the basic fields.
///
/// Only the non-extensible form is produced, so `BODY` and `BODYSTRUCTURE`
/// render identically. The format for each kind of part is:
///
/// - `multipart/*`: (child)(child)(...) content-subtype
/// - `message/rfc822`: content-type content-subtype (content-type-parms)
///   content-id content-description content-transfer-encoding size-octets
///   (rfc3501-envelope) (rfc3501-bodystructure) size-lines
/// - `text/*`: content-type content-subtype (content-type-parms) content-id
///   content-description content-transfer-encoding size-octets size-lines
/// - `*/*`: content-type content-subtype (content-type-parms) content-id
///   content-description content-transfer-encoding size-octets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyStructure {
    /// The content type and subtype of this part.
    pub content_type: (String, String),
    /// Any parameters on the content type.
    pub content_type_parms: Vec<(String, String)>,
    pub content_id: Option<String>,
    pub content_description: Option<String>,
    /// `None` is sent as `7bit`.
    pub content_transfer_encoding: Option<String>,
    /// The exact length of the content of this part, in encoded form.
    pub size_octets: u64,
    /// The number of lines of the content of this part, in encoded form.
    pub size_lines: u64,
    pub kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Single,
    Multipart(Vec<BodyStructure>),
    Message(Envelope, Box<BodyStructure>),
}

impl BodyStructure {
    pub fn of(entity: &Entity) -> Self {
        let kind = match entity.body {
            Body::Single => Kind::Single,
            Body::Multipart(ref children) => {
                Kind::Multipart(children.iter().map(BodyStructure::of).collect())
            },
            Body::Message(ref embedded) => Kind::Message(
                embedded.envelope.clone(),
                Box::new(BodyStructure::of(embedded)),
            ),
        };

        BodyStructure {
            content_type: (
                entity.content_type.media_type.clone(),
                entity.content_type.subtype.clone(),
            ),
            content_type_parms: entity.content_type.parameters.clone(),
            content_id: entity.content_id.clone(),
            content_description: entity.content_description.clone(),
            content_transfer_encoding: entity.content_transfer_encoding.clone(),
            size_octets: entity.content.len() as u64,
            size_lines: entity.line_count(),
            kind,
        }
    }

    pub fn write_to<W: Write>(&self, lex: &mut LexWriter<W>) -> io::Result<()> {
        lex.verbatim("(")?;

        if let Kind::Multipart(ref children) = self.kind {
            for child in children {
                child.write_to(lex)?;
            }
            lex.verbatim(" ")?;
            lex.censored_string(&self.content_type.1)?;
            return lex.verbatim(")");
        }

        lex.censored_string(&self.content_type.0)?;
        lex.verbatim(" ")?;
        lex.censored_string(&self.content_type.1)?;
        lex.verbatim(" ")?;
        if self.content_type_parms.is_empty() {
            lex.nil()?;
        } else {
            lex.verbatim("(")?;
            for (ix, (name, value)) in self.content_type_parms.iter().enumerate()
            {
                if ix > 0 {
                    lex.verbatim(" ")?;
                }
                lex.censored_string(name)?;
                lex.verbatim(" ")?;
                lex.censored_string(value)?;
            }
            lex.verbatim(")")?;
        }
        lex.verbatim(" ")?;
        lex.censored_nstring(&self.content_id)?;
        lex.verbatim(" ")?;
        lex.censored_nstring(&self.content_description)?;
        lex.verbatim(" ")?;
        lex.censored_string(
            self.content_transfer_encoding.as_deref().unwrap_or("7bit"),
        )?;
        lex.verbatim(" ")?;
        lex.num_u64(self.size_octets)?;

        if let Kind::Message(ref envelope, ref embedded) = self.kind {
            lex.verbatim(" ")?;
            envelope.write_to(lex)?;
            lex.verbatim(" ")?;
            embedded.write_to(lex)?;
            lex.verbatim(" ")?;
            lex.num_u64(self.size_lines)?;
        } else if self.content_type.0.eq_ignore_ascii_case("text") {
            lex.verbatim(" ")?;
            lex.num_u64(self.size_lines)?;
        }

        lex.verbatim(")")
    }
}
