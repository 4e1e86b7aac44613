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

//! RFC 4314 access control commands.
//!
//! The engine only relays these; rights strings are passed through to the
//! store uninterpreted apart from the `+`/`-` prefix of `SETACL`.

use super::defs::*;
use crate::imap::response::Data;
use crate::store::model::*;

impl CommandProcessor {
    pub(super) fn cmd_get_acl(&mut self, args: &str) -> CmdResult {
        self.require_capability("ACL", "Command not supported.")?;
        let account = account!(self)?;
        let mailbox = store_name(&astrings(args, 1)?[0], self.utf8_enabled);

        let entries = store_call(|st| account.get_acl(&mailbox, st))?;
        self.send(Data::Acl { mailbox, entries });
        Ok(Status::ok("GETACL command completed."))
    }

    pub(super) fn cmd_set_acl(&mut self, args: &str) -> CmdResult {
        self.require_capability("ACL", "Command not supported.")?;
        let account = account!(self)?;
        let args = astrings(args, 3)?;
        let mailbox = store_name(&args[0], self.utf8_enabled);
        let (identifier, rights) = (&args[1], &args[2]);

        let (modify, rights) = if let Some(rights) = rights.strip_prefix('+') {
            (AclModify::Add, rights)
        } else if let Some(rights) = rights.strip_prefix('-') {
            (AclModify::Remove, rights)
        } else {
            (AclModify::Replace, rights.as_str())
        };

        let mut status = Status::ok("SETACL command completed.");
        account.set_acl(&mailbox, identifier, modify, rights, &mut status);
        finish(status)
    }

    pub(super) fn cmd_delete_acl(&mut self, args: &str) -> CmdResult {
        self.require_capability("ACL", "Command not supported.")?;
        let account = account!(self)?;
        let args = astrings(args, 2)?;
        let mailbox = store_name(&args[0], self.utf8_enabled);

        let mut status = Status::ok("DELETEACL command completed.");
        account.delete_acl(&mailbox, &args[1], &mut status);
        finish(status)
    }

    pub(super) fn cmd_list_rights(&mut self, args: &str) -> CmdResult {
        self.require_capability("ACL", "Command not supported.")?;
        let account = account!(self)?;
        let mut args = astrings(args, 2)?;
        let identifier = args.pop().unwrap_or_default();
        let mailbox =
            store_name(&args.pop().unwrap_or_default(), self.utf8_enabled);

        if let Some(rights) =
            store_call(|st| account.list_rights(&mailbox, &identifier, st))?
        {
            self.send(Data::ListRights {
                mailbox,
                identifier,
                rights,
            });
        }
        Ok(Status::ok("LISTRIGHTS command completed."))
    }

    pub(super) fn cmd_my_rights(&mut self, args: &str) -> CmdResult {
        self.require_capability("ACL", "Command not supported.")?;
        let account = account!(self)?;
        let mailbox = store_name(&astrings(args, 1)?[0], self.utf8_enabled);

        if let Some(rights) = store_call(|st| account.my_rights(&mailbox, st))? {
            self.send(Data::MyRights { mailbox, rights });
        }
        Ok(Status::ok("MYRIGHTS command completed."))
    }
}
