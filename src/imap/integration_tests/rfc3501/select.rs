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

fn populate(setup: &Setup) {
    setup.add_message("INBOX", b"Subject: one\r\n\r\n1", &[Flag::Seen]);
    setup.add_message("INBOX", b"Subject: two\r\n\r\n2", &[]);
    setup.add_message("INBOX", b"Subject: three\r\n\r\n3", &[Flag::Recent]);
}

#[tokio::test]
async fn select_responses() {
    let setup = set_up();
    populate(&setup);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    let mut responses = client.command("SELECT INBOX").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(
        vec![
            "* 3 EXISTS",
            "* 1 RECENT",
            "* OK [UNSEEN 2] Message 2 is the first unseen.",
            "* OK [UIDNEXT 4] Predicted next message UID.",
            "* OK [UIDVALIDITY 42] Folder UID value.",
            "* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)",
            "* OK [PERMANENTFLAGS (\\Answered \\Flagged \\Deleted \\Seen \
             \\Draft \\*)] Avaliable permanent flags.",
        ],
        responses
    );
    assert_like(
        r"A2 OK \[READ-WRITE\] SELECT completed in [0-9]+\.[0-9]{2} seconds\.",
        &tagged,
    );
}

#[tokio::test]
async fn select_empty_mailbox() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    let responses = quick_select(&mut client, "INBOX").await;
    assert_eq!("* 0 EXISTS", responses[0]);
    assert_eq!("* 0 RECENT", responses[1]);
    // No UNSEEN code when everything is seen
    assert_eq!("* OK [UIDNEXT 1] Predicted next message UID.", responses[2]);
}

#[tokio::test]
async fn examine_is_read_only() {
    let setup = set_up();
    populate(&setup);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    let responses = client.command("EXAMINE INBOX").await;
    assert_like(
        r"A2 OK \[READ-ONLY\] EXAMINE completed in [0-9]+\.[0-9]{2} seconds\.",
        responses.last().unwrap(),
    );

    assert_eq!(
        vec!["A3 NO [READ-ONLY] Mailbox is read-only."],
        client.command("EXPUNGE").await
    );
}

#[tokio::test]
async fn select_failures() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    assert_eq!(
        vec!["A3 NO [NOT-UTF-8] Mailbox does not support UTF-8 access."],
        client.command("SELECT INBOX (UTF8)").await
    );
    assert_eq!(
        vec!["A4 NO [NONEXISTENT] Mailbox does not exist."],
        client.command("SELECT nowhere").await
    );
    // A failed SELECT leaves nothing selected
    assert_eq!(
        vec!["A5 NO Error: This command is valid only in selected state."],
        client.command("FETCH 1 FLAGS").await
    );
    assert_eq!(
        vec!["A6 BAD Error in arguments."],
        client.command("SELECT").await
    );
}

#[tokio::test]
async fn close_expunges_silently() {
    let setup = set_up();
    populate(&setup);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    client.ok_command("STORE 2 +FLAGS.SILENT (\\Deleted)").await;
    assert_eq!(
        vec!["A4 OK CLOSE completed."],
        client.command("CLOSE").await
    );
    assert_eq!(2, setup.data.lock().unwrap().mailboxes["INBOX"].messages.len());

    assert_eq!(
        vec!["A5 NO Error: This command is valid only in selected state."],
        client.command("CLOSE").await
    );
}

#[tokio::test]
async fn close_read_only_keeps_messages() {
    let setup = set_up();
    setup.add_message("INBOX", b"Subject: one\r\n\r\n1", &[Flag::Deleted]);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    client.ok_command("EXAMINE INBOX").await;

    assert_eq!(
        vec!["A3 OK CLOSE completed."],
        client.command("CLOSE").await
    );
    assert_eq!(1, setup.data.lock().unwrap().mailboxes["INBOX"].messages.len());
}

#[tokio::test]
async fn noop_reports_changes() {
    let setup = set_up();
    populate(&setup);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    setup.remove_message("INBOX", Uid::u(2));
    let mut responses = client.command("NOOP").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(vec!["* 2 EXPUNGE", "* 2 EXISTS"], responses);
    assert_like(
        r"A3 OK NOOP Completed in [0-9]+\.[0-9]{2} seconds\.",
        &tagged,
    );

    setup.add_message("INBOX", b"Subject: four\r\n\r\n4", &[]);
    assert_eq!(vec!["* 3 EXISTS"], client.ok_command("NOOP").await);
    assert!(client.ok_command("NOOP").await.is_empty());

    setup.remove_message("INBOX", Uid::u(1));
    let mut responses = client.command("CHECK").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(vec!["* 1 EXPUNGE", "* 2 EXISTS"], responses);
    assert_like(
        r"A6 OK CHECK Completed in [0-9]+\.[0-9]{2} seconds\.",
        &tagged,
    );
}
