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

//! Rendering of the message-derived `FETCH` data items.
//!
//! The engine receives messages already parsed into an `Entity` tree. This
//! module turns that tree into the `ENVELOPE` and `BODYSTRUCTURE` values and
//! extracts `BODY[section]` content; the layout rules for the latter are
//! described in `section`.

pub mod bodystructure;
pub mod envelope;
pub mod section;
