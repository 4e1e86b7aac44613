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

//! The command argument tokenizer.
//!
//! By the time a command reaches the dispatcher, the request reader has
//! folded every literal into a quoted string, so arguments consist of only
//! three kinds of token: atoms, quoted strings and parenthesised lists.
//!
//! Atoms are read permissively. In particular, an atom may contain a
//! bracketed section that itself contains spaces and parentheses, so that
//! `BODY[HEADER.FIELDS (From To)]<0.100>` is a single token. Individual
//! commands decide what they accept from there; `body_section` reads the
//! section grammar out of such an atom.

use std::borrow::Cow;

use chrono::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{char, digit1, one_of, space0, space1},
    combinator::{all_consuming, map, map_opt, map_res, opt, value},
    multi::{fold_many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::mime::fetch::section::{BodySection, LeafType};
use crate::store::model::Flag;

/// One command argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Atom(String),
    Quoted(String),
    List(Vec<Value>),
}

impl Value {
    /// Returns the text of an atom or quoted string.
    pub fn as_astring(&self) -> Option<&str> {
        match *self {
            Value::Atom(ref s) | Value::Quoted(ref s) => Some(s),
            Value::List(_) => None,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match *self {
            Value::Atom(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match *self {
            Value::List(ref l) => Some(l),
            _ => None,
        }
    }

    pub fn is_atom(&self, name: &str) -> bool {
        self.as_atom().map_or(false, |s| s.eq_ignore_ascii_case(name))
    }
}

fn quoted_char(i: &str) -> IResult<&str, char> {
    preceded(char('\\'), one_of("\\\""))(i)
}

fn quoted_string_content(i: &str) -> IResult<&str, Cow<str>> {
    fold_many0(
        alt((
            map(quoted_char, |c| {
                let mut s = String::new();
                s.push(c);
                Cow::Owned(s)
            }),
            map(is_not("\"\\"), Cow::Borrowed),
        )),
        || Cow::Borrowed(""),
        |accum: Cow<str>, piece| {
            if accum.is_empty() {
                piece
            } else {
                Cow::Owned(accum.into_owned() + &piece)
            }
        },
    )(i)
}

/// A quoted string.
///
/// Unlike RFC 3501's `quoted`, this accepts CR and LF, since literals folded
/// into quoted strings may contain them.
pub fn quoted(i: &str) -> IResult<&str, Cow<str>> {
    delimited(char('"'), quoted_string_content, char('"'))(i)
}

/// An atom, possibly with embedded bracketed sections.
pub fn atom(i: &str) -> IResult<&str, &str> {
    let mut depth = 0u32;
    let mut end = 0;
    for (ix, ch) in i.char_indices() {
        if depth > 0 {
            match ch {
                '[' => depth += 1,
                ']' => depth -= 1,
                '\r' | '\n' => break,
                _ => (),
            }
        } else {
            match ch {
                '[' => depth = 1,
                ' ' | '(' | ')' | '"' | '{' => break,
                c if c.is_control() => break,
                _ => (),
            }
        }
        end = ix + ch.len_utf8();
    }

    if 0 == end || depth > 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }

    Ok((&i[end..], &i[..end]))
}

fn list(i: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        terminated(char('('), space0),
        separated_list0(space1, arg_value),
        preceded(space0, char(')')),
    )(i)
}

fn arg_value(i: &str) -> IResult<&str, Value> {
    alt((
        map(quoted, |s| Value::Quoted(s.into_owned())),
        map(list, Value::List),
        map(atom, |s| Value::Atom(s.to_owned())),
    ))(i)
}

fn nz_number(i: &str) -> IResult<&str, u32> {
    map_opt(digit1, |s: &str| s.parse::<u32>().ok().filter(|&n| n > 0))(i)
}

fn number64(i: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(i)
}

fn header_field(i: &str) -> IResult<&str, String> {
    alt((
        map(quoted, Cow::into_owned),
        map(
            take_while1(|c: char| {
                !c.is_control()
                    && !matches!(c, ' ' | '(' | ')' | '"' | '{' | '[' | ']')
            }),
            str::to_owned,
        ),
    ))(i)
}

/// A non-empty parenthesised list of header field names.
pub fn header_list(i: &str) -> IResult<&str, Vec<String>> {
    delimited(
        terminated(char('('), space0),
        separated_list1(space1, header_field),
        preceded(space0, char(')')),
    )(i)
}

#[derive(Clone)]
struct SectionText {
    leaf_type: LeafType,
    header_filter: Vec<String>,
    discard_matching_headers: bool,
}

impl SectionText {
    fn plain(leaf_type: LeafType) -> Self {
        SectionText {
            leaf_type,
            header_filter: vec![],
            discard_matching_headers: false,
        }
    }

    fn filtered(header_filter: Vec<String>, discard: bool) -> Self {
        SectionText {
            leaf_type: LeafType::Headers,
            header_filter,
            discard_matching_headers: discard,
        }
    }
}

fn section_text(i: &str) -> IResult<&str, SectionText> {
    alt((
        map(
            preceded(pair(keyword("HEADER.FIELDS.NOT"), space1), header_list),
            |h| SectionText::filtered(h, true),
        ),
        map(
            preceded(pair(keyword("HEADER.FIELDS"), space1), header_list),
            |h| SectionText::filtered(h, false),
        ),
        value(SectionText::plain(LeafType::Headers), keyword("HEADER")),
        value(SectionText::plain(LeafType::Text), keyword("TEXT")),
    ))(i)
}

fn build_section(subscripts: Vec<u32>, text: Option<SectionText>) -> BodySection {
    let text = text.unwrap_or_else(|| SectionText::plain(LeafType::Full));
    BodySection {
        subscripts,
        leaf_type: text.leaf_type,
        header_filter: text.header_filter,
        discard_matching_headers: text.discard_matching_headers,
        ..BodySection::default()
    }
}

/// The possibly empty section specifier between the brackets of `BODY[]`.
///
/// `MIME` is only valid after a part number.
pub fn section_spec(i: &str) -> IResult<&str, BodySection> {
    map(
        opt(alt((
            map(
                pair(
                    separated_list1(char('.'), nz_number),
                    opt(preceded(
                        char('.'),
                        alt((
                            section_text,
                            value(SectionText::plain(LeafType::Mime), keyword("MIME")),
                        )),
                    )),
                ),
                |(subscripts, text)| build_section(subscripts, text),
            ),
            map(section_text, |text| build_section(vec![], Some(text))),
        ))),
        Option::unwrap_or_default,
    )(i)
}

/// A `<offset[.count]>` partial suffix.
pub fn partial(i: &str) -> IResult<&str, (u64, Option<u64>)> {
    delimited(
        char('<'),
        pair(number64, opt(preceded(char('.'), number64))),
        char('>'),
    )(i)
}

/// What follows `BODY[`: a section specifier, the closing bracket and an
/// optional partial.
pub fn body_section(i: &str) -> IResult<&str, BodySection> {
    map(
        pair(terminated(section_spec, char(']')), opt(partial)),
        |(mut section, partial)| {
            section.partial = partial;
            section
        },
    )(i)
}

/// Splits a full argument string into values.
///
/// Leading, trailing and repeated spaces between values are tolerated.
pub fn parse_args(args: &str) -> Option<Vec<Value>> {
    all_consuming(delimited(
        space0,
        separated_list0(space1, arg_value),
        space0,
    ))(args)
    .ok()
    .map(|(_, values)| values)
}

/// Splits a command line into tag, command name and the (possibly empty)
/// remainder.
pub fn command_line(line: &str) -> Option<(&str, &str, &str)> {
    fn tag_atom(i: &str) -> IResult<&str, &str> {
        take_while1(|c: char| {
            !c.is_control()
                && !matches!(c, ' ' | '(' | ')' | '{' | '%' | '*' | '"' | '\\' | '+')
        })(i)
    }

    fn command_name(i: &str) -> IResult<&str, &str> {
        take_while1(|c: char| !c.is_control() && c != ' ')(i)
    }

    let (rest, (tag, command)) =
        pair(tag_atom, preceded(char(' '), command_name))(line).ok()?;
    let rest = match rest.strip_prefix(' ') {
        Some(rest) => rest,
        None if rest.is_empty() => rest,
        None => return None,
    };
    Some((tag, command, rest))
}

/// Parses a parenthesised flag list, such as `(\Seen $Junk)`.
pub fn flag_list(value: &Value) -> Option<Vec<Flag>> {
    value
        .as_list()?
        .iter()
        .map(|v| v.as_atom().and_then(|s| s.parse::<Flag>().ok()))
        .collect()
}

/// Parses an RFC 3501 `date-time`, e.g. `17-Jul-1996 02:44:25 -0700`.
pub fn date_time(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s.trim_start(), "%d-%b-%Y %H:%M:%S %z").ok()
}

/// Matches a keyword without regard to case.
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, ()> {
    value((), nom::bytes::complete::tag_no_case(kw))
}

/// Whether `s` consists of a (case-insensitive) `DONE`, as ends `IDLE`.
pub fn is_done(s: &str) -> bool {
    all_consuming::<_, _, nom::error::Error<&str>, _>(terminated(
        keyword("DONE"),
        space0,
    ))(s)
    .is_ok()
}

/// Parses the arguments of `APPEND` up to, but excluding, the message
/// literal: `mailbox [flag-list] [date-time]`.
pub fn append_args(
    args: &[Value],
) -> Option<(String, Vec<Flag>, Option<DateTime<FixedOffset>>)> {
    let (mailbox, mut rest) = args.split_first()?;
    let mailbox = mailbox.as_astring()?.to_owned();

    let mut flags = Vec::new();
    if let Some((first @ Value::List(_), tail)) = rest.split_first() {
        flags = flag_list(first)?;
        rest = tail;
    }

    let mut date = None;
    if let Some((Value::Quoted(d), tail)) = rest.split_first() {
        date = Some(date_time(d)?);
        rest = tail;
    }

    if rest.is_empty() {
        Some((mailbox, flags, date))
    } else {
        None
    }
}

/// Renders literal bytes as a quoted string, as done when a literal is
/// folded into the command line.
pub fn quote_literal(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 2);
    out.push(b'"');
    for &b in data {
        if b'\\' == b || b'"' == b {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
    out
}

/// Splits off the first space-delimited word of `s`, returning it and the
/// rest.
pub fn first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    s.split_once(' ').unwrap_or((s, ""))
}
