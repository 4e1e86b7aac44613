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

//! Mailbox names on the wire versus in the store.
//!
//! The store always works with UTF-8 names. Until the client enables
//! `UTF8=ACCEPT`, names on the wire are in modified UTF-7 instead, so they are
//! decoded on the way in and encoded on the way out. Once UTF-8 is enabled,
//! the wire form is UTF-8 too and nothing is converted.
//!
//! Whether a name is in wire form depends on the state of the connection at
//! the time, so converted names must not be kept across an `ENABLE`.

use std::borrow::Cow;

use crate::mime::utf7;

/// Converts a mailbox name received from the client to the store's form.
pub fn from_wire(wire: &str, unicode_aware: bool) -> Cow<'_, str> {
    if unicode_aware {
        Cow::Borrowed(wire)
    } else {
        utf7::decode(wire)
    }
}

/// Converts a mailbox name from the store into the form sent to the client.
pub fn to_wire(name: &str, unicode_aware: bool) -> Cow<'_, str> {
    if unicode_aware {
        Cow::Borrowed(name)
    } else {
        utf7::encode(name)
    }
}
