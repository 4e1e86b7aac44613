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

//! The data-item grammar of `FETCH` and `STORE`.
//!
//! `FETCH` items arrive either as a parenthesised list or as a single bare
//! item. The macros `ALL`, `FAST` and `FULL` are replaced by their
//! expansions before anything is classified; only whole items are expanded,
//! so e.g. a header field called `All` inside a section is left alone.

use nom::combinator::all_consuming;
use thiserror::Error;

use super::syntax::{self as s, Value};
use crate::mime::fetch::section::{BodySection, Imap2Section, LeafType};
use crate::store::model::{FetchScope, StoreOp};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemError {
    #[error("Unknown FETCH data-item")]
    Unknown,
    #[error("Malformed FETCH data-item")]
    Malformed,
}

/// One parsed `FETCH` data item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchItem {
    Flags,
    InternalDate,
    Rfc822Size,
    Uid,
    Envelope,
    /// `BODYSTRUCTURE`
    BodyStructure,
    /// `BODY` without a section, the non-extensible structure.
    Body,
    /// `BODY[...]`, `BODY.PEEK[...]` and the `RFC822` forms.
    Section { section: BodySection, peek: bool },
}

impl FetchItem {
    /// Whether fetching this item marks the message `\Seen`.
    pub fn sets_seen(&self) -> bool {
        matches!(*self, FetchItem::Section { peek: false, .. })
    }

    /// How much of the message is needed to render this item, if any.
    pub fn scope(&self) -> Option<FetchScope> {
        match *self {
            FetchItem::Flags
            | FetchItem::InternalDate
            | FetchItem::Rfc822Size
            | FetchItem::Uid => None,
            FetchItem::Envelope => Some(FetchScope::Header),
            FetchItem::BodyStructure | FetchItem::Body => {
                Some(FetchScope::Structure)
            },
            FetchItem::Section { ref section, .. }
                if section.subscripts.is_empty()
                    && LeafType::Headers == section.leaf_type =>
            {
                Some(FetchScope::Header)
            },
            FetchItem::Section { .. } => Some(FetchScope::Full),
        }
    }
}

const FAST: &[&str] = &["FLAGS", "INTERNALDATE", "RFC822.SIZE"];
const ALL: &[&str] = &["FLAGS", "INTERNALDATE", "RFC822.SIZE", "ENVELOPE"];
const FULL: &[&str] =
    &["FLAGS", "INTERNALDATE", "RFC822.SIZE", "ENVELOPE", "BODY"];

/// Parses the data-item argument of `FETCH`.
pub fn parse_fetch_items(text: &str) -> Result<Vec<FetchItem>, ItemError> {
    let mut values = s::parse_args(text).ok_or(ItemError::Malformed)?;
    if let [Value::List(items)] = values.as_mut_slice() {
        values = std::mem::take(items);
    }
    if values.is_empty() {
        return Err(ItemError::Malformed);
    }

    let mut names = Vec::new();
    for value in &values {
        let name = value.as_atom().ok_or(ItemError::Malformed)?;
        let expansion = [("ALL", ALL), ("FAST", FAST), ("FULL", FULL)]
            .iter()
            .find(|&&(mac, _)| mac.eq_ignore_ascii_case(name))
            .map(|&(_, expansion)| expansion);
        match expansion {
            Some(expansion) => names.extend(expansion.iter().copied()),
            None => names.push(name),
        }
    }

    names.into_iter().map(parse_fetch_item).collect()
}

fn parse_fetch_item(name: &str) -> Result<FetchItem, ItemError> {
    for &(prefix, peek) in &[("BODY[", false), ("BODY.PEEK[", true)] {
        if starts_with_ignore_case(name, prefix) {
            let section = parse_body_section(&name[prefix.len()..])
                .ok_or(ItemError::Malformed)?;
            return Ok(FetchItem::Section { section, peek });
        }
    }

    let legacy = |which, leaf_type, peek| FetchItem::Section {
        section: BodySection {
            leaf_type,
            report_as_legacy: Some(which),
            ..BodySection::default()
        },
        peek,
    };

    Ok(match name.to_ascii_uppercase().as_str() {
        "FLAGS" => FetchItem::Flags,
        "INTERNALDATE" => FetchItem::InternalDate,
        "RFC822.SIZE" => FetchItem::Rfc822Size,
        "UID" => FetchItem::Uid,
        "ENVELOPE" => FetchItem::Envelope,
        "BODYSTRUCTURE" => FetchItem::BodyStructure,
        "BODY" => FetchItem::Body,
        "RFC822" => legacy(Imap2Section::Rfc822, LeafType::Full, false),
        "RFC822.HEADER" => {
            legacy(Imap2Section::Rfc822Header, LeafType::Headers, true)
        },
        "RFC822.TEXT" => legacy(Imap2Section::Rfc822Text, LeafType::Text, false),
        _ => return Err(ItemError::Unknown),
    })
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .map_or(false, |p| p.eq_ignore_ascii_case(prefix))
}

/// Parses `section]<partial>`, i.e. what follows `BODY[`.
fn parse_body_section(text: &str) -> Option<BodySection> {
    all_consuming(s::body_section)(text)
        .ok()
        .map(|(_, section)| section)
}

/// The combined scope needed for `items`, or `None` if the message itself
/// need not be loaded.
pub fn fetch_scope(items: &[FetchItem]) -> Option<FetchScope> {
    items.iter().filter_map(FetchItem::scope).max()
}

/// Parses the data-item name of `STORE`: `FLAGS`, `+FLAGS` or `-FLAGS`,
/// each optionally suffixed with `.SILENT`.
///
/// Returns the operation and whether it is silent.
pub fn parse_store_item(name: &str) -> Option<(StoreOp, bool)> {
    let (op, rest) = match name.as_bytes().first() {
        Some(b'+') => (StoreOp::Add, &name[1..]),
        Some(b'-') => (StoreOp::Remove, &name[1..]),
        _ => (StoreOp::Replace, name),
    };

    if rest.eq_ignore_ascii_case("FLAGS") {
        Some((op, false))
    } else if rest.eq_ignore_ascii_case("FLAGS.SILENT") {
        Some((op, true))
    } else {
        None
    }
}
