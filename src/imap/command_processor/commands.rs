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

use std::time::Instant;

use log::{info, warn};

use super::defs::*;
use crate::imap::response::{Data, Response};
use crate::store::model::*;

impl CommandProcessor {
    /// Executes one command which does not need to suspend the reading of
    /// input, returning the tagged response.
    ///
    /// `command` is matched case-insensitively. `args` is everything after
    /// the command name, with literals already folded in.
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &str,
    ) -> Status {
        if let Some(rejection) = self.rejection(command) {
            return rejection;
        }

        let command = command.to_ascii_uppercase();
        let result = match command.as_str() {
            "CAPABILITY" => self.cmd_capability(),
            "NOOP" => self.cmd_noop(),
            "LOGOUT" => self.cmd_logout(),
            "LOGIN" => self.cmd_log_in(args),
            "ENABLE" => self.cmd_enable(args),
            "NAMESPACE" => self.cmd_namespace(),
            "LIST" => self.cmd_list(false, args),
            "LSUB" => self.cmd_list(true, args),
            "CREATE" | "DELETE" | "SUBSCRIBE" | "UNSUBSCRIBE" => {
                self.cmd_mailbox_op(&command, args)
            },
            "RENAME" => self.cmd_rename(args),
            "STATUS" => self.cmd_status(args),
            "SELECT" => self.cmd_select(args, false),
            "EXAMINE" => self.cmd_select(args, true),
            "APPEND" => self.cmd_append_line(),
            "GETQUOTAROOT" => self.cmd_get_quota_root(args),
            "GETQUOTA" => self.cmd_get_quota(args),
            "GETACL" => self.cmd_get_acl(args),
            "SETACL" => self.cmd_set_acl(args),
            "DELETEACL" => self.cmd_delete_acl(args),
            "LISTRIGHTS" => self.cmd_list_rights(args),
            "MYRIGHTS" => self.cmd_my_rights(args),
            "CHECK" => self.cmd_check(),
            "CLOSE" => self.cmd_close(),
            "EXPUNGE" => self.cmd_expunge(),
            "SEARCH" => self.cmd_search(false, args),
            "COPY" => self.cmd_copy(false, args),
            "FETCH" => self.cmd_fetch(false, args),
            "STORE" => self.cmd_store(false, args),
            "UID" => self.cmd_uid(args),
            _ => {
                self.note_bad_command();
                warn!(
                    "{} Unrecognised command {:?} ({} so far)",
                    self.log_prefix, command, self.bad_commands
                );
                Err(Status::bad(format!(
                    "Error: Command '{}' not recognized.",
                    command
                )))
            },
        };

        match result {
            Ok(status) | Err(status) => status,
        }
    }

    fn cmd_capability(&mut self) -> CmdResult {
        let mut caps = Vec::new();
        if !self.secure && self.tls_available {
            caps.push("STARTTLS".to_owned());
        }
        caps.extend(self.system_config.capabilities.iter().cloned());
        caps.extend(self.sasl.names().map(|name| format!("AUTH={}", name)));

        self.send(Data::Capability(caps));
        Ok(Status::ok("CAPABILITY completed."))
    }

    fn cmd_noop(&mut self) -> CmdResult {
        let start = Instant::now();
        if let (Some(account), Some(selected)) =
            (self.account.as_deref_mut(), self.selected.as_mut())
        {
            poll(account, selected, &self.pipeline)?;
        }

        Ok(Status::ok(format!(
            "NOOP Completed in {} seconds.",
            elapsed(start)
        )))
    }

    fn cmd_check(&mut self) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;
        let selected = selected!(self)?;
        poll(account, selected, &self.pipeline)?;

        Ok(Status::ok(format!(
            "CHECK Completed in {} seconds.",
            elapsed(start)
        )))
    }

    fn cmd_logout(&mut self) -> CmdResult {
        info!("{} Logging out", self.log_prefix);
        self.pipeline
            .send(Response::Bye("IMAP4rev1 Server logging out.".to_owned()));
        self.selected = None;
        self.logged_out = true;
        Ok(Status::ok("LOGOUT completed."))
    }

    fn cmd_enable(&mut self, args: &str) -> CmdResult {
        self.require_capability("ENABLE", "Command 'ENABLE' not supported.")?;
        account!(self)?;

        let values = s::parse_args(args)
            .filter(|v| !v.is_empty())
            .and_then(|v| {
                v.iter()
                    .map(|v| v.as_atom().map(str::to_owned))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                Status::bad("No arguments, or syntax error in an argument.")
            })?;

        let mut enabled = Vec::new();
        for cap in values {
            if cap.eq_ignore_ascii_case("UTF8=ACCEPT")
                && self.system_config.has_capability("UTF8=ACCEPT")
            {
                if !self.utf8_enabled {
                    self.utf8_enabled = true;
                    self.pipeline.set_unicode_aware(true);
                }
                enabled.push("UTF8=ACCEPT".to_owned());
            }
        }

        self.send(Data::Enabled(enabled));
        Ok(Status::ok("ENABLE command completed."))
    }

    fn cmd_namespace(&mut self) -> CmdResult {
        self.require_capability("NAMESPACE", "Command not supported.")?;
        let account = account!(self)?;
        let namespaces = store_call(|st| account.namespace(st))?;
        self.send(Data::Namespace(namespaces));
        Ok(Status::ok("NAMESPACE command completed."))
    }

    /// Checks the preconditions of `STARTTLS`.
    ///
    /// On success, the caller sends the returned status, waits for it to be
    /// written, and performs the handshake.
    pub fn start_tls_check(&self) -> CmdResult {
        if self.account.is_some() {
            Err(Status::no(
                "This ommand is only valid in not-authenticated state.",
            ))
        } else if self.secure {
            Err(Status::no(
                "Bad sequence of commands: Connection is already secure.",
            ))
        } else if !self.tls_available {
            Err(Status::no("TLS not available: Server has no SSL certificate."))
        } else {
            Ok(Status::ok("Begin TLS negotiation now."))
        }
    }

    /// Called once the TLS handshake has completed.
    pub fn tls_established(&mut self) {
        self.secure = true;
        self.log_prefix.set_secure();
        info!("{} TLS established", self.log_prefix);
    }
}
