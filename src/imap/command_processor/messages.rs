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

use chrono::prelude::*;
use log::info;

use super::defs::*;
use crate::imap::response::{Data, Response};
use crate::imap::sequence_set::SequenceSet;
use crate::store::model::*;
use crate::store::AppendSink;

impl CommandProcessor {
    pub(super) fn cmd_expunge(&mut self) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;
        let selected = selected!(self)?;
        poll(account, selected, &self.pipeline)?;

        if selected.read_only {
            return Err(Status::no("Mailbox is read-only.").with_code("READ-ONLY"));
        }

        let deleted = selected
            .messages()
            .iter()
            .filter(|m| m.flags.contains(&Flag::Deleted))
            .cloned()
            .collect::<Vec<_>>();

        // Each removal renumbers everything after it, so the index is
        // reindexed before the next EXPUNGE number is taken.
        for message in deleted {
            store_call(|st| account.expunge(&selected.name, &message, st))?;
            if let Some(seq_no) = selected.remove_message(&message) {
                self.pipeline.send(Response::Data(Data::Expunge(seq_no)));
                selected.reindex();
            }
        }

        Ok(Status::ok(format!(
            "EXPUNGE completed in {} seconds.",
            elapsed(start)
        )))
    }

    pub(super) fn cmd_search(&mut self, uid: bool, args: &str) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;
        let selected = selected!(self)?;

        let mut criteria = args.trim();
        let mut charset = None;
        let (first, rest) = s::first_word(criteria);
        if first.eq_ignore_ascii_case("CHARSET") {
            let (name, rest) = s::first_word(rest);
            let name = name.trim_matches('"');
            if !name.eq_ignore_ascii_case("US-ASCII")
                && !name.eq_ignore_ascii_case("UTF-8")
            {
                return Err(Status::no("Not supported charset.")
                    .with_code("BADCHARSET (US-ASCII UTF-8)"));
            }
            charset = Some(name);
            criteria = rest.trim();
        }

        if criteria.is_empty() || s::parse_args(criteria).is_none() {
            return Err(args_error());
        }

        poll(account, selected, &self.pipeline)?;
        let uids = store_call(|st| {
            account.search(&selected.name, charset, criteria, st)
        })?;

        let hits = if uid {
            uids.into_iter().map(Uid::get).collect()
        } else {
            uids.into_iter()
                .filter_map(|u| selected.seq_no_of_uid(u))
                .collect()
        };

        self.send(Data::Search(hits));
        Ok(Status::ok(format!(
            "SEARCH completed in {} seconds.",
            elapsed(start)
        )))
    }

    pub(super) fn cmd_copy(&mut self, uid: bool, args: &str) -> CmdResult {
        let account = account!(self)?;
        let selected = selected!(self)?;

        let (set, rest) = s::first_word(args);
        let set = set.parse::<SequenceSet>().map_err(|_| args_error())?;
        let destination = store_name(&astrings(rest, 1)?[0], self.utf8_enabled);

        poll(account, selected, &self.pipeline)?;
        let messages = selected.filter(uid, &set);

        let mut status = Status::ok("COPY completed.");
        account.copy(&selected.name, &messages, &destination, &mut status);
        finish(status)
    }

    pub(super) fn cmd_uid(&mut self, args: &str) -> CmdResult {
        account!(self)?;
        selected!(self)?;

        let (command, rest) = s::first_word(args);
        match command.to_ascii_uppercase().as_str() {
            "COPY" => self.cmd_copy(true, rest),
            "FETCH" => self.cmd_fetch(true, rest),
            "STORE" => self.cmd_store(true, rest),
            "SEARCH" => self.cmd_search(true, rest),
            _ => Err(args_error()),
        }
    }

    /// `APPEND` arriving as a plain line means its arguments could not be
    /// understood.
    pub(super) fn cmd_append_line(&mut self) -> CmdResult {
        account!(self)?;
        Err(args_error())
    }

    /// Asks the store for somewhere to put an `APPEND`ed message.
    ///
    /// On success, the caller sends the continuation and feeds exactly
    /// `size` octets into the returned sink.
    pub fn append_start(
        &mut self,
        mailbox: &str,
        flags: Vec<Flag>,
        date: Option<DateTime<FixedOffset>>,
        size: u32,
    ) -> PartialResult<Box<dyn AppendSink>> {
        if let Some(rejection) = self.rejection("APPEND") {
            return Err(rejection);
        }

        let account = account!(self)?;
        let mailbox = store_name(mailbox, self.utf8_enabled);
        let flags = flags.into_iter().collect::<FlagSet>();
        store_call(|st| account.append(&mailbox, &flags, date, size, st))?
            .ok_or_else(|| {
                Status::no("Internal server error: No storage stream available.")
            })
    }

    /// Completes an `APPEND` whose data has all been written to `sink`.
    pub fn append_finish(
        &mut self,
        sink: Box<dyn AppendSink>,
        start: Instant,
    ) -> Status {
        let mut status = Status::ok(format!(
            "APPEND command completed in {} seconds.",
            elapsed(start)
        ));
        sink.finish(&mut status);
        if status.is_ok() {
            info!("{} Message appended", self.log_prefix);
        }
        status
    }
}
