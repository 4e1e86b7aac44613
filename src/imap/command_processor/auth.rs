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

use log::{info, warn};

use super::defs::*;
use crate::sasl::SaslExchange;
use crate::store::model::*;

impl CommandProcessor {
    pub(super) fn cmd_log_in(&mut self, args: &str) -> CmdResult {
        if self.account.is_some() {
            return Err(Status::no("Re-authentication error."));
        }

        if self.system_config.has_capability("LOGINDISABLED") {
            return Err(Status::no(
                "Command 'LOGIN' is disabled, use AUTHENTICATE instead.",
            ));
        }

        let args = astrings(args, 2)?;
        let (user, password) = (&args[0], &args[1]);

        let mut status = Status::ok("LOGIN completed.");
        match self.store.log_in(user, password, &mut status) {
            Some(account) if status.is_ok() => {
                self.log_in_as(account);
                Ok(status)
            },
            _ => {
                warn!("{} Rejected login for user {:?}", self.log_prefix, user);
                if status.is_ok() {
                    Err(Status::no("LOGIN failed."))
                } else {
                    Err(status)
                }
            },
        }
    }

    /// Begins an `AUTHENTICATE` exchange.
    ///
    /// Returns the exchange and the decoded initial response, if the client
    /// sent one.
    pub fn authenticate_start(
        &self,
        args: &str,
    ) -> PartialResult<(Box<dyn SaslExchange>, Option<Vec<u8>>)> {
        if self.account.is_some() {
            return Err(Status::no("Re-authentication error."));
        }

        let words = args.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>();
        let (mechanism, initial) = match words.as_slice() {
            &[mechanism] => (mechanism, None),
            &[mechanism, initial] => (mechanism, Some(initial)),
            _ => return Err(args_error()),
        };

        let initial = match initial {
            None => None,
            Some("=") => Some(Vec::new()),
            Some(initial) => Some(base64::decode(initial).map_err(|_| {
                Status::bad(
                    "Syntax error: Parameter 'initial-response' value must \
                     be BASE64 or contain a single character '='.",
                )
            })?),
        };

        let mechanism = self.sasl.find(mechanism).ok_or_else(|| {
            Status::no("Not supported authentication mechanism.")
        })?;

        info!(
            "{} Starting SASL {} authentication",
            self.log_prefix,
            mechanism.name()
        );
        Ok((mechanism.start(), initial))
    }

    /// Completes a successful SASL exchange by opening the account of
    /// `identity`.
    pub fn authenticate_finish(&mut self, identity: &str) -> Status {
        match self.store.open_account(identity) {
            Some(account) => {
                self.log_in_as(account);
                Status::ok("Authentication succeeded.")
            },
            None => {
                warn!(
                    "{} SASL identity {:?} has no account",
                    self.log_prefix, identity
                );
                Status::no("Authentication credentials invalid.")
            },
        }
    }

    /// Checks whether `IDLE` may start.
    pub fn idle_start(&mut self) -> CmdResult {
        account!(self)?;
        Ok(Status::ok("IDLE terminated."))
    }

    /// Runs one resynchronisation of the selected mailbox on behalf of
    /// `IDLE`.
    pub fn idle_tick(&mut self) {
        if let (Some(account), Some(selected)) =
            (self.account.as_deref_mut(), self.selected.as_mut())
        {
            if let Err(status) = poll(account, selected, &self.pipeline) {
                warn!(
                    "{} Poll during IDLE failed: {}",
                    self.log_prefix, status.text
                );
            }
        }
    }
}
