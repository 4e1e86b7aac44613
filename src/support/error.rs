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

use std::io;

use thiserror::Error;

/// Errors which are not expressible as a tagged IMAP response.
///
/// Anything a client can cause by sending bad input is reported through a
/// `Status` instead; an `Error` reaching the session loop tears the session
/// down.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsafe key or mailbox name")]
    UnsafeName,
    #[error("Unknown flag")]
    UnknownFlag,
    #[error("Invalid sequence set")]
    BadSequenceSet,
    #[error("Command line too long")]
    LineTooLong,
    #[error("Response pipeline halted")]
    PipelineHalted,
    #[error("Connection closed by peer")]
    Disconnected,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error means the peer simply went away.
    ///
    /// A halted response pipeline counts, since it only halts after a write
    /// to the client has failed.
    pub fn is_disconnect(&self) -> bool {
        match *self {
            Error::Disconnected | Error::PipelineHalted => true,
            Error::Io(ref e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}
