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

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// The configuration of the IMAP engine.
///
/// Typically loaded from a TOML table by the embedding application. Every
/// field has a usable default, so an empty document is a valid configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// The host name reported in the greeting.
    ///
    /// If empty, `localhost` is used.
    pub host_name: String,

    /// Replaces the text of the greeting line if non-empty.
    ///
    /// The greeting is always sent as an untagged `OK`; only the
    /// human-readable part is configurable.
    pub greeting: String,

    /// The capabilities advertised by `CAPABILITY`.
    ///
    /// `STARTTLS` and the `AUTH=` entries are derived from the transport and
    /// the registered SASL mechanisms and must not be listed here.
    ///
    /// Several commands are gated on their capability being present: removing
    /// `ACL` disables the ACL commands, and so on. Adding `LOGINDISABLED`
    /// causes `LOGIN` to be refused.
    pub capabilities: Vec<String>,

    /// The number of unrecognised commands tolerated before the connection is
    /// dropped with a `BYE`. 0 means no limit.
    pub max_bad_commands: u32,

    /// The period, in seconds, at which the selected mailbox is resynchronised
    /// while the client is idling.
    pub idle_tick_secs: u64,

    /// How long, in seconds, a connection may go without sending a line
    /// before it is disconnected. 0 disables the timeout.
    pub idle_timeout_secs: u64,

    /// The maximum length of a single command line, including any literals
    /// absorbed into it (but not the `APPEND` payload).
    pub max_command_line: usize,

    /// The hierarchy delimiter reported by `LIST` and `LSUB`.
    pub hierarchy_delimiter: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            host_name: String::new(),
            greeting: String::new(),
            capabilities: DEFAULT_CAPABILITIES
                .iter()
                .map(|&s| s.to_owned())
                .collect(),
            max_bad_commands: 30,
            idle_tick_secs: 30,
            idle_timeout_secs: 1800,
            max_command_line: 65536,
            hierarchy_delimiter: "/".to_owned(),
        }
    }
}

const DEFAULT_CAPABILITIES: &[&str] = &[
    "IMAP4rev1",
    "NAMESPACE",
    "QUOTA",
    "ACL",
    "IDLE",
    "ENABLE",
    "UTF8=ACCEPT",
    "SASL-IR",
];

impl SystemConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Whether the given capability is configured, ignoring case.
    pub fn has_capability(&self, cap: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(cap))
    }

    /// The text following `* OK ` in the greeting.
    pub fn greeting_text(&self) -> String {
        if !self.greeting.is_empty() {
            self.greeting.clone()
        } else {
            let host = if self.host_name.is_empty() {
                "localhost"
            } else {
                &self.host_name
            };
            format!("{} IMAP4rev1 server ready.", host)
        }
    }
}
