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

use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::imap::mailbox_index::SelectedMailbox;
use crate::imap::mailbox_name;
use crate::imap::response::{Data, Response};
use crate::imap::response_pipeline::ResponsePipeline;
use crate::sasl::SaslRegistry;
use crate::store::model::*;
use crate::store::{Account, MailStore};
use crate::support::{log_prefix::LogPrefix, system_config::SystemConfig};

pub(super) use crate::imap::syntax as s;

/// Receives parsed commands, tracks the session state, and produces
/// responses.
///
/// Untagged responses are submitted to the response pipeline as they are
/// produced; the tagged response is returned to the caller.
///
/// The commands that suspend the reading of further input (`STARTTLS`,
/// `AUTHENTICATE`, `APPEND` and `IDLE`) are driven by the server, which calls
/// into the processor for their synchronous parts.
pub struct CommandProcessor {
    pub(super) log_prefix: LogPrefix,
    pub(super) system_config: Arc<SystemConfig>,
    pub(super) store: Arc<dyn MailStore>,
    pub(super) sasl: Arc<SaslRegistry>,
    pub(super) pipeline: ResponsePipeline,

    pub(super) account: Option<Box<dyn Account>>,
    pub(super) selected: Option<SelectedMailbox>,
    pub(super) utf8_enabled: bool,

    pub(super) secure: bool,
    pub(super) tls_available: bool,
    pub(super) rejected: bool,
    pub(super) bad_commands: u32,
    pub(super) logged_out: bool,
}

/// Used for the convenient `?` operator. Either way, the contained status is
/// sent as the tagged response.
pub(super) type CmdResult = Result<Status, Status>;

/// Return value from an operation that can either succeed with a value, or
/// fail with an IMAP response.
pub(super) type PartialResult<T> = Result<T, Status>;

impl CommandProcessor {
    pub fn new(
        log_prefix: LogPrefix,
        system_config: Arc<SystemConfig>,
        store: Arc<dyn MailStore>,
        sasl: Arc<SaslRegistry>,
        pipeline: ResponsePipeline,
    ) -> Self {
        CommandProcessor {
            log_prefix,
            system_config,
            store,
            sasl,
            pipeline,

            account: None,
            selected: None,
            utf8_enabled: false,

            secure: false,
            tls_available: false,
            rejected: false,
            bad_commands: 0,
            logged_out: false,
        }
    }

    /// Records the security properties of the transport.
    pub fn set_transport_state(&mut self, secure: bool, tls_available: bool) {
        self.secure = secure;
        self.tls_available = tls_available;
    }

    /// Makes every command but `LOGOUT` fail.
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    pub fn is_authenticated(&self) -> bool {
        self.account.is_some()
    }

    pub fn logged_out(&self) -> bool {
        self.logged_out
    }

    pub fn log_prefix(&self) -> &LogPrefix {
        &self.log_prefix
    }

    /// Returns the response to send instead of executing `command`, if the
    /// session has been rejected.
    pub fn rejection(&self, command: &str) -> Option<Status> {
        if self.rejected && !command.eq_ignore_ascii_case("LOGOUT") {
            Some(Status::no("Bad sequence of commands: Session rejected."))
        } else {
            None
        }
    }

    /// Counts a command that could not be understood.
    pub(super) fn note_bad_command(&mut self) {
        self.bad_commands = self.bad_commands.saturating_add(1);
    }

    /// Whether the client has sent more unrecognised commands than allowed.
    pub fn too_many_bad_commands(&self) -> bool {
        let max = self.system_config.max_bad_commands;
        max > 0 && self.bad_commands > max
    }

    pub(super) fn send(&self, data: Data) {
        self.pipeline.send(Response::Data(data));
    }

    pub(super) fn log_in_as(&mut self, account: Box<dyn Account>) {
        self.log_prefix.set_user(account.user_name().to_owned());
        info!("{} Login successful", self.log_prefix);
        self.account = Some(account);
    }

    pub(super) fn require_capability(
        &self,
        capability: &str,
        missing: &str,
    ) -> PartialResult<()> {
        if self.system_config.has_capability(capability) {
            Ok(())
        } else {
            Err(Status::no(missing))
        }
    }

    pub(super) fn delimiter(&self) -> &str {
        &self.system_config.hierarchy_delimiter
    }
}

pub(super) fn args_error() -> Status {
    Status::bad("Error in arguments.")
}

pub(super) fn seqset_error() -> Status {
    Status::bad("Error in arguments: Invalid 'sequence-set' value.")
}

/// Parses exactly `n` `astring` arguments.
pub(super) fn astrings(args: &str, n: usize) -> PartialResult<Vec<String>> {
    let values = s::parse_args(args).ok_or_else(args_error)?;
    if values.len() != n {
        return Err(args_error());
    }

    values
        .iter()
        .map(|v| v.as_astring().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(args_error)
}

/// Converts a mailbox name argument to the form the store works with.
pub(super) fn store_name(wire: &str, unicode_aware: bool) -> String {
    mailbox_name::from_wire(wire, unicode_aware).into_owned()
}

/// Seconds since `start`, as reported in "completed in" texts.
pub(super) fn elapsed(start: Instant) -> String {
    format!("{:.2}", start.elapsed().as_secs_f64())
}

/// Converts a status the store may have overwritten into a result.
pub(super) fn finish(status: Status) -> CmdResult {
    if status.is_ok() {
        Ok(status)
    } else {
        Err(status)
    }
}

/// Calls a store operation with a preloaded status, failing with whatever
/// the store left in it if it is not OK.
pub(super) fn store_call<T>(
    f: impl FnOnce(&mut Status) -> T,
) -> PartialResult<T> {
    let mut status = Status::ok("");
    let ret = f(&mut status);
    if status.is_ok() {
        Ok(ret)
    } else {
        Err(status)
    }
}

/// Resynchronises `selected` against the store, sending the resulting
/// `EXPUNGE` and `EXISTS` responses.
pub(super) fn poll(
    account: &mut dyn Account,
    selected: &mut SelectedMailbox,
    pipeline: &ResponsePipeline,
) -> PartialResult<()> {
    let fresh = store_call(|st| account.messages_info(&selected.name, st))?;
    for response in selected.resync(fresh) {
        pipeline.send(response);
    }
    Ok(())
}
