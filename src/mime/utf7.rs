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

//! IMAP's modified UTF-7 (RFC 3501 section 5.1.3).
//!
//! Only mailbox names use this encoding. Printable ASCII other than `&`
//! stands for itself, `&-` is a literal `&`, and everything else travels as
//! big-endian UTF-16 in a variant of base64 between `&` and `-`.

use std::borrow::Cow;

/// Decodes a modified UTF-7 string.
///
/// Decoding never fails. Anything that is not a well-formed shifted run is
/// passed through as it stands, and the closing `-` is optional.
pub fn decode(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(shift) = rest.find('&') {
        out.push_str(&rest[..shift]);
        let shifted = &rest[shift + 1..];
        let run_len = shifted.bytes().take_while(|&b| is_base64(b)).count();
        let (run, after) = shifted.split_at(run_len);

        if run.is_empty() {
            out.push('&');
            rest = after.strip_prefix('-').unwrap_or(after);
            continue;
        }

        match decode_run(run) {
            Some(decoded) => {
                out.push_str(&decoded);
                rest = after.strip_prefix('-').unwrap_or(after);
            },
            None => {
                out.push('&');
                out.push_str(run);
                rest = after;
            },
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Encodes `s` into modified UTF-7.
///
/// The result is the canonical form: no redundant shifts, and every shifted
/// run is closed with `-`.
pub fn encode(s: &str) -> Cow<'_, str> {
    if s.bytes().all(|b| is_direct(b) && b'&' != b) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() * 2);
    let mut pending = Vec::<u16>::new();
    for ch in s.chars() {
        if '&' == ch {
            flush_run(&mut out, &mut pending);
            out.push_str("&-");
        } else if ch.is_ascii() && is_direct(ch as u8) {
            flush_run(&mut out, &mut pending);
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(ch.encode_utf16(&mut units));
        }
    }
    flush_run(&mut out, &mut pending);

    Cow::Owned(out)
}

fn decode_run(run: &str) -> Option<String> {
    let bytes = base64::decode_config(
        run,
        base64::IMAP_MUTF7.decode_allow_trailing_bits(true),
    )
    .ok()?;
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect::<Vec<_>>();
    Some(String::from_utf16_lossy(&units))
}

fn flush_run(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }

    let bytes = pending
        .iter()
        .flat_map(|unit| unit.to_be_bytes())
        .collect::<Vec<u8>>();
    out.push('&');
    out.push_str(&base64::encode_config(&bytes, base64::IMAP_MUTF7));
    out.push('-');
    pending.clear();
}

fn is_direct(b: u8) -> bool {
    (b' '..=b'~').contains(&b)
}

fn is_base64(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b'+' == b || b',' == b
}
