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

use super::defs::*;
use crate::store::model::{Flag, Uid};
use crate::support::system_config::SystemConfig;

#[tokio::test]
async fn capability_declared() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    let responses = client.command("CAPABILITY").await;
    assert!(responses[0].split(' ').any(|cap| "IDLE" == cap));
}

#[tokio::test]
async fn idle_requires_authentication() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    assert_eq!(
        vec!["A1 NO Authentication required."],
        client.command("IDLE").await
    );
}

#[tokio::test(start_paused = true)]
async fn idle_reports_changes() {
    let setup = set_up_with(SystemConfig {
        idle_timeout_secs: 0,
        ..SystemConfig::default()
    });
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[]);
    setup.add_message("INBOX", b"Subject: 2\r\n\r\n2", &[Flag::Seen]);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    client.write_raw(b"A3 IDLE\r\n").await;
    assert_eq!("+ idling", client.read_line().await.unwrap());

    // Picked up on the next tick
    setup.remove_message("INBOX", Uid::u(1));
    assert_eq!("* 1 EXPUNGE", client.read_line().await.unwrap());
    assert_eq!("* 1 EXISTS", client.read_line().await.unwrap());

    setup.add_message("INBOX", b"Subject: 3\r\n\r\n3", &[]);
    assert_eq!("* 2 EXISTS", client.read_line().await.unwrap());

    client.write_raw(b"DONE\r\n").await;
    assert_eq!("A3 OK IDLE terminated.", client.read_line().await.unwrap());

    // The session carries on normally
    assert_eq!(
        vec!["* 1 FETCH (UID 2)", "* 2 FETCH (UID 3)"],
        client.ok_command("FETCH 1:* UID").await
    );
}

#[tokio::test]
async fn idle_without_mailbox() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    client.write_raw(b"A2 IDLE\r\n").await;
    assert_eq!("+ idling", client.read_line().await.unwrap());
    client.write_raw(b"done\r\n").await;
    assert_eq!("A2 OK IDLE terminated.", client.read_line().await.unwrap());
}

#[tokio::test]
async fn only_done_ends_idle() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    client.write_raw(b"A2 IDLE\r\n").await;
    assert_eq!("+ idling", client.read_line().await.unwrap());
    client.write_raw(b"A3 NOOP\r\nDONE NOW\r\nDONE\r\n").await;
    assert_eq!("A2 OK IDLE terminated.", client.read_line().await.unwrap());

    // Ensure the server isn't broken
    quick_select(&mut client, "INBOX").await;
}

#[tokio::test]
async fn closed_while_idling() {
    let setup = set_up();
    let (mut client, handle) = setup.connect_with_handle();
    quick_log_in(&mut client).await;

    client.write_raw(b"A2 IDLE\r\n").await;
    assert_eq!("+ idling", client.read_line().await.unwrap());

    handle.close("Server shutting down.");
    assert_eq!(
        "* BYE Server shutting down.",
        client.read_line().await.unwrap()
    );
    assert_eq!(None, client.read_line().await);
}
