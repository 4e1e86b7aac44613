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

use log::warn;

use super::defs::*;
use crate::imap::data_items::{self, FetchItem, ItemError};
use crate::imap::response::{Data, FetchAttr, Response};
use crate::imap::sequence_set::SequenceSet;
use crate::mime::fetch::bodystructure::BodyStructure;
use crate::mime::Entity;
use crate::store::model::*;

impl CommandProcessor {
    pub(super) fn cmd_fetch(&mut self, uid: bool, args: &str) -> CmdResult {
        let start = Instant::now();
        let account = account!(self)?;
        let selected = selected!(self)?;

        let (set, items) =
            args.trim_start().split_once(' ').ok_or_else(args_error)?;
        let set = set.parse::<SequenceSet>().map_err(|_| seqset_error())?;
        let mut items =
            data_items::parse_fetch_items(items).map_err(|e| match e {
                ItemError::Unknown => {
                    Status::bad("Error in arguments: Unknown FETCH data-item.")
                },
                ItemError::Malformed => args_error(),
            })?;

        // UID FETCH always reports the UID, whether asked for or not
        if uid && !items.contains(&FetchItem::Uid) {
            items.insert(0, FetchItem::Uid);
        }

        poll(account, selected, &self.pipeline)?;

        let scope = data_items::fetch_scope(&items);
        let mark_seen =
            !selected.read_only && items.iter().any(FetchItem::sets_seen);
        let seen = std::iter::once(Flag::Seen).collect::<FlagSet>();

        for message in selected.filter(uid, &set) {
            let entity = match scope {
                None => None,
                Some(scope) => match store_call(|st| {
                    account.fetch_message(&selected.name, &message, scope, st)
                })? {
                    Some(entity) => Some(entity),
                    // Vanished since the last poll; the next one will say so
                    None => continue,
                },
            };

            let attrs = items
                .iter()
                .filter_map(|item| render(item, &message, entity.as_ref()))
                .collect();
            self.pipeline.send(Response::Data(Data::Fetch {
                seq: message.seq_no,
                attrs,
            }));

            if mark_seen && !message.flags.contains(&Flag::Seen) {
                match store_call(|st| {
                    account.store_flags(
                        &selected.name,
                        &message,
                        StoreOp::Add,
                        &seen,
                        st,
                    )
                }) {
                    Ok(()) => selected.set_flags(
                        message.uid,
                        StoreOp::Add.apply(&message.flags, &seen),
                    ),
                    Err(status) => warn!(
                        "{} Failed to set \\Seen on UID {}: {}",
                        self.log_prefix, message.uid, status.text
                    ),
                }
            }
        }

        Ok(Status::ok(format!(
            "FETCH command completed in {} seconds.",
            elapsed(start)
        )))
    }
}

fn render(
    item: &FetchItem,
    message: &MessageInfo,
    entity: Option<&Entity>,
) -> Option<FetchAttr> {
    Some(match *item {
        FetchItem::Flags => FetchAttr::Flags(message.flags.clone()),
        FetchItem::InternalDate => FetchAttr::InternalDate(message.internal_date),
        FetchItem::Rfc822Size => FetchAttr::Rfc822Size(message.size),
        FetchItem::Uid => FetchAttr::Uid(message.uid),
        FetchItem::Envelope => {
            FetchAttr::Envelope(Box::new(entity?.envelope.clone()))
        },
        FetchItem::BodyStructure => {
            FetchAttr::BodyStructure(true, Box::new(BodyStructure::of(entity?)))
        },
        FetchItem::Body => {
            FetchAttr::BodyStructure(false, Box::new(BodyStructure::of(entity?)))
        },
        FetchItem::Section { ref section, .. } => {
            FetchAttr::Section(section.response_name(), section.fetch(entity?))
        },
    })
}
