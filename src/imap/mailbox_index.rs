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

use std::collections::HashSet;

use super::response::{Data, Response};
use super::sequence_set::SequenceSet;
use crate::store::model::*;

/// The messages of the currently selected mailbox, in mailbox order.
///
/// Sequence numbers are the 1-based positions in `messages`. Everything
/// except `remove_message` keeps them current; after removing messages, the
/// caller must `reindex()` before reading sequence numbers again.
#[derive(Clone, Debug)]
pub struct SelectedMailbox {
    pub name: String,
    pub read_only: bool,
    messages: Vec<MessageInfo>,
}

impl SelectedMailbox {
    pub fn new(name: String, read_only: bool, messages: Vec<MessageInfo>) -> Self {
        let mut this = SelectedMailbox {
            name,
            read_only,
            messages,
        };
        this.reindex();
        this
    }

    pub fn len(&self) -> u32 {
        self.messages.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[MessageInfo] {
        &self.messages
    }

    pub fn max_uid(&self) -> Option<Uid> {
        self.messages.iter().map(|m| m.uid).max()
    }

    /// Returns the messages whose sequence number (or UID, if `by_uid`) is
    /// in `set`, in mailbox order.
    pub fn filter(&self, by_uid: bool, set: &SequenceSet) -> Vec<MessageInfo> {
        if by_uid {
            let star = self.max_uid().map_or(0, Uid::get);
            self.messages
                .iter()
                .filter(|m| set.contains(m.uid.get(), star))
                .cloned()
                .collect()
        } else {
            let star = self.len();
            self.messages
                .iter()
                .filter(|m| set.contains(m.seq_no, star))
                .cloned()
                .collect()
        }
    }

    pub fn seq_no_of_uid(&self, uid: Uid) -> Option<u32> {
        self.messages
            .iter()
            .find(|m| m.uid == uid)
            .map(|m| m.seq_no)
    }

    /// Removes `message` without renumbering the rest.
    ///
    /// Returns the sequence number the message had.
    pub fn remove_message(&mut self, message: &MessageInfo) -> Option<u32> {
        let ix = self.messages.iter().position(|m| m.id == message.id)?;
        Some(self.messages.remove(ix).seq_no)
    }

    /// Reassigns sequence numbers 1..N in mailbox order.
    pub fn reindex(&mut self) {
        for (ix, message) in self.messages.iter_mut().enumerate() {
            message.seq_no = ix as u32 + 1;
        }
    }

    /// Replaces the cached flags of the message with the given UID.
    pub fn set_flags(&mut self, uid: Uid, flags: FlagSet) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.uid == uid) {
            message.flags = flags;
        }
    }

    /// Brings the index in line with a fresh listing from the store.
    ///
    /// Returns the unsolicited responses that tell the client about the
    /// difference: one `EXPUNGE` per message that disappeared, numbered as
    /// of the moment each is removed, then `EXISTS` if the count changed or
    /// new messages arrived.
    pub fn resync(&mut self, fresh: Vec<MessageInfo>) -> Vec<Response> {
        let mut responses = Vec::new();
        let old_count = self.len();
        let fresh_ids = fresh.iter().map(|m| m.id.as_str()).collect::<HashSet<_>>();
        let gone = self
            .messages
            .iter()
            .filter(|m| !fresh_ids.contains(m.id.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        for message in gone {
            if let Some(seq_no) = self.remove_message(&message) {
                responses.push(Response::Data(Data::Expunge(seq_no)));
                self.reindex();
            }
        }

        let known_ids = self
            .messages
            .iter()
            .map(|m| m.id.as_str())
            .collect::<HashSet<_>>();
        let has_new = fresh.iter().any(|m| !known_ids.contains(m.id.as_str()));

        self.messages = fresh;
        self.reindex();

        if has_new || self.len() != old_count {
            responses.push(Response::Data(Data::Exists(self.len())));
        }

        responses
    }

    /// The number of messages flagged `\Recent`.
    pub fn recent_count(&self) -> u32 {
        count_flagged(&self.messages, &Flag::Recent)
    }

    /// The sequence number of the first message without `\Seen`.
    pub fn first_unseen(&self) -> Option<u32> {
        self.messages
            .iter()
            .find(|m| !m.flags.contains(&Flag::Seen))
            .map(|m| m.seq_no)
    }

    /// The predicted next UID, which is one past the highest UID in use
    /// unless the store knows of a larger one.
    pub fn uid_next(&self, from_store: Option<u32>) -> u32 {
        uid_next(&self.messages, from_store)
    }
}

pub fn count_flagged(messages: &[MessageInfo], flag: &Flag) -> u32 {
    messages.iter().filter(|m| m.flags.contains(flag)).count() as u32
}

pub fn unseen_count(messages: &[MessageInfo]) -> u32 {
    messages.len() as u32 - count_flagged(messages, &Flag::Seen)
}

pub fn uid_next(messages: &[MessageInfo], from_store: Option<u32>) -> u32 {
    let computed = messages
        .iter()
        .map(|m| m.uid.get())
        .max()
        .map_or(1, |max| max.saturating_add(1));
    from_store.map_or(computed, |s| s.max(computed))
}
