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

use crate::imap::integration_tests::defs::*;
use crate::store::model::{Flag, Uid};

fn message_count(setup: &Setup, mailbox: &str) -> usize {
    setup.data.lock().unwrap().mailboxes[mailbox].messages.len()
}

#[tokio::test]
async fn expunge_renumbers_as_it_goes() {
    let setup = set_up();
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[]);
    setup.add_message("INBOX", b"Subject: 2\r\n\r\n2", &[Flag::Deleted]);
    setup.add_message("INBOX", b"Subject: 3\r\n\r\n3", &[]);
    setup.add_message("INBOX", b"Subject: 4\r\n\r\n4", &[Flag::Deleted]);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    let mut responses = client.command("EXPUNGE").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(vec!["* 2 EXPUNGE", "* 3 EXPUNGE"], responses);
    assert_like(
        r"A3 OK EXPUNGE completed in [0-9]+\.[0-9]{2} seconds\.",
        &tagged,
    );
    assert_eq!(2, message_count(&setup, "INBOX"));

    // The index agrees with the client about what is left
    assert_eq!(
        vec!["* 1 FETCH (UID 1)", "* 2 FETCH (UID 3)"],
        client.ok_command("FETCH 1:* UID").await
    );
    assert!(client.ok_command("NOOP").await.is_empty());
}

#[tokio::test]
async fn expunge_stops_at_first_failure() {
    let setup = set_up();
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[Flag::Deleted]);
    setup.add_message("INBOX", b"Subject: 2\r\n\r\n2", &[Flag::Deleted]);
    setup.add_message("INBOX", b"Subject: 3\r\n\r\n3", &[Flag::Deleted]);
    setup.fail_on("INBOX", Uid::u(2));
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    let mut responses = client.command("EXPUNGE").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(vec!["* 1 EXPUNGE"], responses);
    assert_eq!("A3 NO Simulated store failure.", tagged);
    assert_eq!(2, message_count(&setup, "INBOX"));

    assert_eq!(
        vec!["* 1 FETCH (UID 2)", "* 2 FETCH (UID 3)"],
        client.ok_command("FETCH 1:* UID").await
    );
}

#[tokio::test]
async fn copy() {
    let setup = set_up();
    setup.create_mailbox("Archive");
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[Flag::Flagged]);
    setup.add_message("INBOX", b"Subject: 2\r\n\r\n2", &[]);
    setup.add_message("INBOX", b"Subject: 3\r\n\r\n3", &[]);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    assert_eq!(
        vec!["A3 OK COPY completed."],
        client.command("COPY 1:2 Archive").await
    );
    assert_eq!(2, message_count(&setup, "Archive"));
    assert!(setup
        .flags_of("Archive", Uid::u(1))
        .contains(&Flag::Flagged));

    assert_eq!(
        vec!["A4 OK COPY completed."],
        client.command("UID COPY 3 Archive").await
    );
    assert_eq!(3, message_count(&setup, "Archive"));

    assert_eq!(
        vec!["A5 NO [TRYCREATE] Mailbox does not exist."],
        client.command("COPY 1 Missing").await
    );
    assert_eq!(
        vec!["A6 BAD Error in arguments."],
        client.command("COPY x Archive").await
    );
    assert_eq!(
        vec!["A7 BAD Error in arguments."],
        client.command("COPY 1").await
    );
}

#[tokio::test]
async fn append() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    let message = b"Subject: appended\r\n\r\nHello\r\n";
    client
        .write_raw(
            format!("B1 APPEND INBOX (\\Seen) {{{}}}\r\n", message.len())
                .as_bytes(),
        )
        .await;
    assert_eq!("+ Ready for literal data.", client.read_line().await.unwrap());
    client.write_raw(message).await;
    client.write_raw(b"\r\n").await;
    assert_like(
        r"B1 OK APPEND command completed in [0-9]+\.[0-9]{2} seconds\.",
        &client.read_line().await.unwrap(),
    );

    {
        let data = setup.data.lock().unwrap();
        let stored = &data.mailboxes["INBOX"].messages[0];
        assert_eq!(&message[..], &stored.data[..]);
        assert!(stored.info.flags.contains(&Flag::Seen));
    }

    // The selected mailbox learns of it on the next poll
    assert_eq!(vec!["* 1 EXISTS"], client.ok_command("NOOP").await);
}

#[tokio::test]
async fn append_with_date() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    client
        .write_raw(b"B1 APPEND INBOX \"17-Jul-1996 02:44:25 -0700\" {7}\r\n")
        .await;
    assert_eq!("+ Ready for literal data.", client.read_line().await.unwrap());
    client.write_raw(b"\r\nhello\r\n").await;
    assert_like(
        r"B1 OK APPEND command completed in [0-9]+\.[0-9]{2} seconds\.",
        &client.read_line().await.unwrap(),
    );

    quick_select(&mut client, "INBOX").await;
    assert_eq!(
        vec!["* 1 FETCH (INTERNALDATE \"17-Jul-1996 02:44:25 -0700\")"],
        client.ok_command("FETCH 1 INTERNALDATE").await
    );
}

#[tokio::test]
async fn append_failures() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    // Refused before the literal is sent, so the client sends nothing more
    client.write_raw(b"B1 APPEND INBOX {5}\r\n").await;
    assert_eq!(
        "B1 NO Authentication required.",
        client.read_line().await.unwrap()
    );

    client
        .ok_command(&format!("LOGIN {} {}", USER, PASSWORD))
        .await;
    client.write_raw(b"B2 APPEND Nowhere {5}\r\n").await;
    assert_eq!(
        "B2 NO [TRYCREATE] Mailbox does not exist.",
        client.read_line().await.unwrap()
    );

    assert_eq!(
        vec!["A2 BAD Error in arguments."],
        client.command("APPEND").await
    );
    assert_eq!(0, message_count(&setup, "INBOX"));
}
