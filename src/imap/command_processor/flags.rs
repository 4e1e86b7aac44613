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

use super::defs::*;
use crate::imap::data_items;
use crate::imap::response::{Data, FetchAttr, Response};
use crate::imap::sequence_set::SequenceSet;
use crate::store::model::*;

impl CommandProcessor {
    pub(super) fn cmd_store(&mut self, uid: bool, args: &str) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;
        let selected = selected!(self)?;

        let values = s::parse_args(args).ok_or_else(args_error)?;
        let (set, op, silent, flags) = match values.as_slice() {
            [set, item, flags @ s::Value::List(_)] => {
                let set = set
                    .as_atom()
                    .and_then(|set| set.parse::<SequenceSet>().ok())
                    .ok_or_else(args_error)?;
                let (op, silent) = item
                    .as_atom()
                    .and_then(data_items::parse_store_item)
                    .ok_or_else(args_error)?;
                let flags = s::flag_list(flags).ok_or_else(args_error)?;
                (set, op, silent, flags.into_iter().collect::<FlagSet>())
            },
            _ => return Err(args_error()),
        };

        poll(account, selected, &self.pipeline)?;

        for message in selected.filter(uid, &set) {
            store_call(|st| {
                account.store_flags(&selected.name, &message, op, &flags, st)
            })?;

            let new_flags = op.apply(&message.flags, &flags);
            selected.set_flags(message.uid, new_flags.clone());

            if !silent {
                let mut attrs = vec![FetchAttr::Flags(new_flags)];
                if uid {
                    attrs.push(FetchAttr::Uid(message.uid));
                }
                self.pipeline.send(Response::Data(Data::Fetch {
                    seq: message.seq_no,
                    attrs,
                }));
            }
        }

        Ok(Status::ok(format!(
            "STORE command completed in {} seconds.",
            elapsed(start)
        )))
    }
}
