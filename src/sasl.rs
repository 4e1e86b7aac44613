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

//! Pluggable SASL mechanisms for `AUTHENTICATE`.
//!
//! The engine handles only the IMAP framing (base64 and the `+` continuation
//! lines); the mechanisms themselves are supplied by the application.

use std::fmt;
use std::sync::Arc;

/// A SASL mechanism, such as `PLAIN` or `CRAM-MD5`.
pub trait SaslMechanism: Send + Sync {
    /// The IANA name of the mechanism, upper case.
    fn name(&self) -> &str;

    /// Begins a new exchange.
    fn start(&self) -> Box<dyn SaslExchange>;
}

/// One run of a mechanism.
pub trait SaslExchange: Send {
    /// Feeds the next client response into the mechanism.
    ///
    /// The very first call receives the initial response if the client sent
    /// one (`SASL-IR`), and an empty slice otherwise.
    fn step(&mut self, client: &[u8]) -> SaslStep;
}

#[derive(Clone, PartialEq, Eq)]
pub enum SaslStep {
    /// Send this challenge and wait for another response.
    Challenge(Vec<u8>),
    /// Authentication is complete; the value is the authenticated identity
    /// to be passed to `MailStore::open_account`.
    Success(String),
    Failure,
}

impl fmt::Debug for SaslStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SaslStep::Challenge(ref c) => write!(f, "Challenge({} bytes)", c.len()),
            SaslStep::Success(ref id) => write!(f, "Success({:?})", id),
            SaslStep::Failure => write!(f, "Failure"),
        }
    }
}

/// The mechanisms available to a server, in advertisement order.
#[derive(Clone, Default)]
pub struct SaslRegistry {
    mechanisms: Vec<Arc<dyn SaslMechanism>>,
}

impl SaslRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mechanism: Arc<dyn SaslMechanism>) {
        self.mechanisms.push(mechanism);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.mechanisms.iter().map(|m| m.name())
    }

    /// Finds a mechanism by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn SaslMechanism>> {
        self.mechanisms
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}
