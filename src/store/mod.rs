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

//! The mailbox-store collaborator.
//!
//! The engine never touches mail data directly. Instead, each IMAP operation
//! that needs persistent state is forwarded to an `Account` obtained from the
//! `MailStore` at login.
//!
//! Every operation takes a `&mut Status` preloaded with the response the
//! engine will send on success. An implementation reports failure by
//! overwriting it (e.g. with `Status::no("Mailbox does not exist.")
//! .with_code("TRYCREATE")`); a non-OK status is sent to the client verbatim
//! as the command's tagged response, and the engine stops processing the
//! command at that point.
//!
//! The engine treats every call as atomic and never retries. Concurrency
//! control between connections sharing a mailbox is the store's business.

pub mod model;

use std::io;

use chrono::prelude::*;

use self::model::*;
use crate::mime::Entity;

/// Entry point to the store; shared by all sessions.
pub trait MailStore: Send + Sync {
    /// Checks a plaintext password and opens the user's account.
    ///
    /// On failure, returns `None`; `status` may be overwritten to customise
    /// the response.
    fn log_in(
        &self,
        user: &str,
        password: &str,
        status: &mut Status,
    ) -> Option<Box<dyn Account>>;

    /// Opens the account of a user whose identity was already established by
    /// a SASL mechanism.
    fn open_account(&self, identity: &str) -> Option<Box<dyn Account>>;
}

/// The view of one user's mail data, owned by a single session.
pub trait Account: Send {
    /// The canonical name of the logged-in user.
    fn user_name(&self) -> &str;

    fn namespace(&mut self, _status: &mut Status) -> Namespaces {
        Namespaces {
            personal: vec![Namespace {
                prefix: String::new(),
                delimiter: "/".to_owned(),
            }],
            ..Namespaces::default()
        }
    }

    fn list(
        &mut self,
        reference: &str,
        pattern: &str,
        status: &mut Status,
    ) -> Vec<ListEntry>;

    fn lsub(
        &mut self,
        reference: &str,
        pattern: &str,
        status: &mut Status,
    ) -> Vec<ListEntry>;

    fn create(&mut self, mailbox: &str, status: &mut Status);
    fn delete(&mut self, mailbox: &str, status: &mut Status);
    fn rename(&mut self, from: &str, to: &str, status: &mut Status);
    fn subscribe(&mut self, mailbox: &str, status: &mut Status);
    fn unsubscribe(&mut self, mailbox: &str, status: &mut Status);

    /// Opens a mailbox for `SELECT`, `EXAMINE` or `STATUS`.
    ///
    /// Returns `None` if the mailbox cannot be opened, in which case `status`
    /// should be set to explain why.
    fn select(
        &mut self,
        mailbox: &str,
        status: &mut Status,
    ) -> Option<SelectResponse>;

    /// Lists the messages currently in `mailbox`, in ascending UID order.
    ///
    /// `seq_no` of the returned values is ignored.
    fn messages_info(
        &mut self,
        mailbox: &str,
        status: &mut Status,
    ) -> Vec<MessageInfo>;

    /// Starts appending a message of `size` octets.
    ///
    /// Returns the sink the message data is to be written to, or `None` if
    /// the message cannot be accepted.
    fn append(
        &mut self,
        mailbox: &str,
        flags: &FlagSet,
        internal_date: Option<DateTime<FixedOffset>>,
        size: u32,
        status: &mut Status,
    ) -> Option<Box<dyn AppendSink>>;

    /// Changes the flags of one message.
    fn store_flags(
        &mut self,
        mailbox: &str,
        message: &MessageInfo,
        op: StoreOp,
        flags: &FlagSet,
        status: &mut Status,
    );

    /// Permanently removes one message.
    fn expunge(
        &mut self,
        mailbox: &str,
        message: &MessageInfo,
        status: &mut Status,
    );

    fn copy(
        &mut self,
        mailbox: &str,
        messages: &[MessageInfo],
        destination: &str,
        status: &mut Status,
    );

    /// Evaluates `SEARCH` criteria.
    ///
    /// `criteria` is the text of the search key list as sent by the client,
    /// with any literals already absorbed into quoted strings. Returns the
    /// UIDs of the matching messages.
    fn search(
        &mut self,
        mailbox: &str,
        charset: Option<&str>,
        criteria: &str,
        status: &mut Status,
    ) -> Vec<Uid>;

    /// Loads a message for `FETCH`.
    fn fetch_message(
        &mut self,
        mailbox: &str,
        message: &MessageInfo,
        scope: FetchScope,
        status: &mut Status,
    ) -> Option<Entity>;

    /// Returns the quota roots of `mailbox` and the quotas of each.
    fn get_quota_root(
        &mut self,
        _mailbox: &str,
        status: &mut Status,
    ) -> (Vec<String>, Vec<Quota>) {
        *status = not_supported();
        (vec![], vec![])
    }

    fn get_quota(&mut self, _root: &str, status: &mut Status) -> Option<Quota> {
        *status = not_supported();
        None
    }

    fn get_acl(&mut self, _mailbox: &str, status: &mut Status) -> Vec<AclEntry> {
        *status = not_supported();
        vec![]
    }

    fn set_acl(
        &mut self,
        _mailbox: &str,
        _identifier: &str,
        _modify: AclModify,
        _rights: &str,
        status: &mut Status,
    ) {
        *status = not_supported();
    }

    fn delete_acl(
        &mut self,
        _mailbox: &str,
        _identifier: &str,
        status: &mut Status,
    ) {
        *status = not_supported();
    }

    fn list_rights(
        &mut self,
        _mailbox: &str,
        _identifier: &str,
        status: &mut Status,
    ) -> Option<ListRights> {
        *status = not_supported();
        None
    }

    fn my_rights(&mut self, _mailbox: &str, status: &mut Status) -> Option<String> {
        *status = not_supported();
        None
    }
}

/// Receives the payload of an `APPEND`.
pub trait AppendSink: Send {
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Called once all octets have been written.
    fn finish(self: Box<Self>, status: &mut Status);
}

fn not_supported() -> Status {
    Status::no("Command not supported.")
}
