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

const GREETINGS: &[u8] =
    b"From: foo@bar.com\r\nSubject: Greetings\r\n\r\nHello\r\nWorld\r\n";

async fn selected_client(setup: &Setup) -> TestClient {
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;
    client
}

#[tokio::test]
async fn partial_body() {
    let setup = set_up();
    let message = message_of_size("Big", 1500);
    setup.add_message("INBOX", &message, &[]);
    let mut client = selected_client(&setup).await;

    let mut responses = client.command("FETCH 1 (BODY[]<0.50>)").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(
        vec![format!(
            "* 1 FETCH (BODY[]<0> {{50}}\r\n{})",
            String::from_utf8_lossy(&message[..50])
        )],
        responses
    );
    assert_like(
        r"A3 OK FETCH command completed in [0-9]+\.[0-9]{2} seconds\.",
        &tagged,
    );

    // Non-PEEK fetch of the body marks the message seen
    assert!(setup.flags_of("INBOX", Uid::u(1)).contains(&Flag::Seen));

    let tail = message.len() - 10;
    assert_eq!(
        vec![format!(
            "* 1 FETCH (BODY[]<{}> {{10}}\r\n{})",
            tail,
            String::from_utf8_lossy(&message[tail..])
        )],
        client
            .ok_command(&format!("FETCH 1 BODY.PEEK[]<{}.100>", tail))
            .await
    );
    assert_eq!(
        vec!["* 1 FETCH (BODY[]<5000> {0}\r\n)"],
        client.ok_command("FETCH 1 BODY.PEEK[]<5000.10>").await
    );
}

#[tokio::test]
async fn uid_fetch_reports_uid() {
    let setup = set_up();
    setup.add_message("INBOX", GREETINGS, &[]);
    setup.add_message("INBOX", GREETINGS, &[Flag::Seen]);
    let mut client = selected_client(&setup).await;

    assert_eq!(
        vec!["* 1 FETCH (UID 1 FLAGS ())", "* 2 FETCH (UID 2 FLAGS (\\Seen))"],
        client.ok_command("UID FETCH 1:* (FLAGS)").await
    );
    assert_eq!(
        vec!["* 2 FETCH (FLAGS (\\Seen) UID 2)"],
        client.ok_command("UID FETCH 2 (FLAGS UID)").await
    );
    assert!(client.ok_command("UID FETCH 5 FLAGS").await.is_empty());
    assert_eq!(
        vec!["* 2 FETCH (FLAGS (\\Seen))"],
        client.ok_command("FETCH * FLAGS").await
    );
}

#[tokio::test]
async fn fetch_macros_and_metadata() {
    let setup = set_up();
    setup.add_message("INBOX", GREETINGS, &[]);
    let mut client = selected_client(&setup).await;

    assert_eq!(
        vec![format!(
            "* 1 FETCH (FLAGS () INTERNALDATE \"04-Jul-2020 12:30:00 +0100\" \
             RFC822.SIZE {})",
            GREETINGS.len()
        )],
        client.ok_command("FETCH 1 FAST").await
    );
    assert_eq!(
        vec![
            "* 1 FETCH (ENVELOPE (NIL \"Greetings\" NIL NIL NIL NIL NIL NIL \
             NIL NIL))"
        ],
        client.ok_command("FETCH 1 ENVELOPE").await
    );
    assert_eq!(
        vec![
            "* 1 FETCH (BODYSTRUCTURE (\"text\" \"plain\" \
             (\"charset\" \"us-ascii\") NIL NIL \"7bit\" 14 2))"
        ],
        client.ok_command("FETCH 1 BODYSTRUCTURE").await
    );
    assert_eq!(
        vec![
            "* 1 FETCH (BODY (\"text\" \"plain\" (\"charset\" \"us-ascii\") \
             NIL NIL \"7bit\" 14 2))"
        ],
        client.ok_command("FETCH 1 BODY").await
    );
}

#[tokio::test]
async fn fetch_sections() {
    let setup = set_up();
    setup.add_message("INBOX", GREETINGS, &[]);
    let mut client = selected_client(&setup).await;

    assert_eq!(
        vec![
            "* 1 FETCH (BODY[HEADER.FIELDS (Subject)] {22}\r\n\
             Subject: Greetings\r\n\r\n)"
        ],
        client
            .ok_command("FETCH 1 BODY.PEEK[HEADER.FIELDS (Subject)]")
            .await
    );
    assert_eq!(
        vec!["* 1 FETCH (BODY[TEXT] {14}\r\nHello\r\nWorld\r\n)"],
        client.ok_command("FETCH 1 BODY.PEEK[TEXT]").await
    );
    // Nonexistent parts are empty rather than errors
    assert_eq!(
        vec!["* 1 FETCH (BODY[3] {0}\r\n)"],
        client.ok_command("FETCH 1 BODY.PEEK[3]").await
    );

    // Nothing so far set \Seen
    assert!(setup.flags_of("INBOX", Uid::u(1)).is_empty());
}

#[tokio::test]
async fn examine_does_not_set_seen() {
    let setup = set_up();
    setup.add_message("INBOX", GREETINGS, &[]);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    client.ok_command("EXAMINE INBOX").await;

    client.ok_command("FETCH 1 BODY[TEXT]").await;
    assert!(setup.flags_of("INBOX", Uid::u(1)).is_empty());
}

#[tokio::test]
async fn fetch_errors() {
    let setup = set_up();
    setup.add_message("INBOX", GREETINGS, &[]);
    let mut client = selected_client(&setup).await;

    assert_eq!(
        vec!["A3 BAD Error in arguments: Invalid 'sequence-set' value."],
        client.command("FETCH x FLAGS").await
    );
    assert_eq!(
        vec!["A4 BAD Error in arguments: Unknown FETCH data-item."],
        client.command("FETCH 1 BOGUS").await
    );
    assert_eq!(
        vec!["A5 BAD Error in arguments."],
        client.command("FETCH 1 (FLAGS").await
    );
    assert_eq!(
        vec!["A6 BAD Error in arguments."],
        client.command("FETCH 1").await
    );
}

#[tokio::test]
async fn fetch_reports_removal_first() {
    let setup = set_up();
    setup.add_message("INBOX", GREETINGS, &[]);
    setup.add_message("INBOX", GREETINGS, &[]);
    let mut client = selected_client(&setup).await;

    setup.remove_message("INBOX", Uid::u(1));
    assert_eq!(
        vec![
            "* 1 EXPUNGE",
            "* 1 EXISTS",
            "* 1 FETCH (ENVELOPE (NIL \"Greetings\" NIL NIL NIL NIL NIL NIL \
             NIL NIL))",
        ],
        client.ok_command("FETCH 1:* ENVELOPE").await
    );
}
