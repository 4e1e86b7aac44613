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

//! RFC 2087 `GETQUOTAROOT` and `GETQUOTA`.

use super::defs::*;
use crate::imap::response::Data;
use crate::store::model::*;

impl CommandProcessor {
    pub(super) fn cmd_get_quota_root(&mut self, args: &str) -> CmdResult {
        self.require_capability("QUOTA", "Command not supported.")?;
        let account = account!(self)?;
        let mailbox = store_name(&astrings(args, 1)?[0], self.utf8_enabled);

        let (roots, quotas) =
            store_call(|st| account.get_quota_root(&mailbox, st))?;
        self.send(Data::QuotaRoot { mailbox, roots });
        for quota in quotas {
            self.send(Data::Quota(quota));
        }

        Ok(Status::ok("GETQUOTAROOT command completed."))
    }

    pub(super) fn cmd_get_quota(&mut self, args: &str) -> CmdResult {
        self.require_capability("QUOTA", "Command not supported.")?;
        let account = account!(self)?;
        let root = store_name(&astrings(args, 1)?[0], self.utf8_enabled);

        if let Some(quota) = store_call(|st| account.get_quota(&root, st))? {
            self.send(Data::Quota(quota));
        }

        Ok(Status::ok("QUOTA command completed."))
    }
}
