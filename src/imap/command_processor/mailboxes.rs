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
use crate::imap::mailbox_index::{self, SelectedMailbox};
use crate::imap::response::{Data, Response};
use crate::store::model::*;

impl CommandProcessor {
    pub(super) fn cmd_list(&mut self, lsub: bool, args: &str) -> CmdResult {
        let start = Instant::now();
        let delimiter = self.delimiter().to_owned();
        let account = account!(self)?;
        let args = astrings(args, 2)?;
        let reference = store_name(&args[0], self.utf8_enabled);
        let pattern = store_name(&args[1], self.utf8_enabled);

        let entries = if !lsub && pattern.is_empty() {
            // Just asking for the hierarchy delimiter
            vec![ListEntry {
                attributes: vec!["\\Noselect".to_owned()],
                name: String::new(),
            }]
        } else if lsub {
            store_call(|st| account.lsub(&reference, &pattern, st))?
        } else {
            store_call(|st| account.list(&reference, &pattern, st))?
        };

        for entry in entries {
            self.send(Data::List {
                lsub,
                attributes: entry.attributes,
                delimiter: delimiter.clone(),
                name: entry.name,
            });
        }

        Ok(Status::ok(format!(
            "{} Completed in {} seconds.",
            if lsub { "LSUB" } else { "LIST" },
            elapsed(start)
        )))
    }

    /// `CREATE`, `DELETE`, `SUBSCRIBE` and `UNSUBSCRIBE`, which differ only
    /// in which store operation they call.
    pub(super) fn cmd_mailbox_op(
        &mut self,
        command: &str,
        args: &str,
    ) -> CmdResult {
        let account = account!(self)?;
        let mailbox = store_name(&astrings(args, 1)?[0], self.utf8_enabled);

        let mut status = Status::ok(format!("{} command completed.", command));
        match command {
            "CREATE" => account.create(&mailbox, &mut status),
            "DELETE" => account.delete(&mailbox, &mut status),
            "SUBSCRIBE" => account.subscribe(&mailbox, &mut status),
            _ => account.unsubscribe(&mailbox, &mut status),
        }
        finish(status)
    }

    pub(super) fn cmd_rename(&mut self, args: &str) -> CmdResult {
        let account = account!(self)?;
        let args = astrings(args, 2)?;
        let from = store_name(&args[0], self.utf8_enabled);
        let to = store_name(&args[1], self.utf8_enabled);

        let mut status = Status::ok("RENAME command completed.");
        account.rename(&from, &to, &mut status);
        finish(status)
    }

    pub(super) fn cmd_status(&mut self, args: &str) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;

        let values = s::parse_args(args).ok_or_else(args_error)?;
        let (mailbox, items) = match values.as_slice() {
            [mailbox, items] => (
                mailbox.as_astring().ok_or_else(args_error)?,
                items.as_list().ok_or_else(args_error)?,
            ),
            _ => return Err(args_error()),
        };

        let mut items = items
            .iter()
            .map(|v| v.as_atom().and_then(|a| a.parse::<StatusItem>().ok()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(args_error)?;
        items.sort_unstable();
        items.dedup();

        let mailbox = store_name(mailbox, self.utf8_enabled);
        let response = store_call(|st| account.select(&mailbox, st))?
            .ok_or_else(|| Status::no("Mailbox does not exist."))?;
        let messages = store_call(|st| account.messages_info(&mailbox, st))?;

        let items = items
            .into_iter()
            .map(|item| {
                let value = match item {
                    StatusItem::Messages => messages.len() as u32,
                    StatusItem::Recent => {
                        mailbox_index::count_flagged(&messages, &Flag::Recent)
                    },
                    StatusItem::UidNext => {
                        mailbox_index::uid_next(&messages, response.uid_next)
                    },
                    StatusItem::UidValidity => response.uid_validity,
                    StatusItem::Unseen => mailbox_index::unseen_count(&messages),
                };
                (item, value)
            })
            .collect();

        self.send(Data::Status { mailbox, items });
        Ok(Status::ok(format!(
            "STATUS completed in {} seconds.",
            elapsed(start)
        )))
    }

    pub(super) fn cmd_select(&mut self, args: &str, examine: bool) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;
        self.selected = None;

        let values = s::parse_args(args).ok_or_else(args_error)?;
        let mailbox = match values.as_slice() {
            [mailbox] => mailbox.as_astring().ok_or_else(args_error)?,
            [_, params]
                if params
                    .as_list()
                    .map_or(false, |p| p.iter().any(|v| v.is_atom("UTF8"))) =>
            {
                return Err(Status::no(
                    "Mailbox does not support UTF-8 access.",
                )
                .with_code("NOT-UTF-8"));
            },
            _ => return Err(args_error()),
        };

        let mailbox = store_name(mailbox, self.utf8_enabled);
        let response = store_call(|st| account.select(&mailbox, st))?
            .ok_or_else(|| Status::no("Mailbox does not exist."))?;
        let messages = store_call(|st| account.messages_info(&mailbox, st))?;

        let read_only = examine || response.read_only;
        let selected = SelectedMailbox::new(mailbox, read_only, messages);

        self.send(Data::Exists(selected.len()));
        self.send(Data::Recent(selected.recent_count()));
        if let Some(unseen) = selected.first_unseen() {
            self.pipeline.send(Response::Untagged(
                Status::ok(format!("Message {} is the first unseen.", unseen))
                    .with_code(format!("UNSEEN {}", unseen)),
            ));
        }
        self.pipeline.send(Response::Untagged(
            Status::ok("Predicted next message UID.").with_code(format!(
                "UIDNEXT {}",
                selected.uid_next(response.uid_next)
            )),
        ));
        self.pipeline.send(Response::Untagged(
            Status::ok("Folder UID value.")
                .with_code(format!("UIDVALIDITY {}", response.uid_validity)),
        ));
        self.send(Data::Flags(response.flags.clone()));

        let mut permanent = response
            .permanent_flags
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>();
        if response.new_keywords {
            permanent.push("\\*".to_owned());
        }
        self.pipeline.send(Response::Untagged(
            Status::ok("Avaliable permanent flags.")
                .with_code(format!("PERMANENTFLAGS ({})", permanent.join(" "))),
        ));

        info!(
            "{} Selected {:?} ({} messages{})",
            self.log_prefix,
            selected.name,
            selected.len(),
            if read_only { ", read-only" } else { "" }
        );
        self.selected = Some(selected);

        Ok(Status::ok(format!(
            "{} completed in {} seconds.",
            if examine { "EXAMINE" } else { "SELECT" },
            elapsed(start)
        ))
        .with_code(if read_only { "READ-ONLY" } else { "READ-WRITE" }))
    }

    pub(super) fn cmd_close(&mut self) -> CmdResult {
        let account = account!(self)?;
        let selected = selected!(self)?;

        if !selected.read_only {
            // The client gets no EXPUNGE responses for these, so the index
            // is refreshed without telling it anything either.
            match store_call(|st| account.messages_info(&selected.name, st)) {
                Ok(fresh) => {
                    selected.resync(fresh);
                },
                Err(status) => warn!(
                    "{} Refresh before CLOSE failed: {}",
                    self.log_prefix, status.text
                ),
            }

            let deleted = selected
                .messages()
                .iter()
                .filter(|m| m.flags.contains(&Flag::Deleted))
                .cloned()
                .collect::<Vec<_>>();
            for message in deleted {
                if let Err(status) = store_call(|st| {
                    account.expunge(&selected.name, &message, st)
                }) {
                    warn!(
                        "{} Implicit EXPUNGE failed: {}",
                        self.log_prefix, status.text
                    );
                    break;
                }
            }
        }

        self.selected = None;
        Ok(Status::ok("CLOSE completed."))
    }
}
