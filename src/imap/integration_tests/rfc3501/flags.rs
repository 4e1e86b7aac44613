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

async fn selected_client(setup: &Setup) -> TestClient {
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;
    client
}

#[tokio::test]
async fn add_and_remove_flags() {
    let setup = set_up();
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[]);
    let mut client = selected_client(&setup).await;

    let mut responses = client.command("STORE 1 +FLAGS (\\Flagged)").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(vec!["* 1 FETCH (FLAGS (\\Flagged))"], responses);
    assert_like(
        r"A3 OK STORE command completed in [0-9]+\.[0-9]{2} seconds\.",
        &tagged,
    );
    assert!(setup.flags_of("INBOX", Uid::u(1)).contains(&Flag::Flagged));

    assert_eq!(
        vec!["* 1 FETCH (FLAGS (\\Flagged $Important))"],
        client.ok_command("STORE 1 +FLAGS ($Important)").await
    );
    assert_eq!(
        vec!["* 1 FETCH (FLAGS ($Important))"],
        client.ok_command("STORE 1 -FLAGS (\\Flagged)").await
    );
    assert_eq!(
        vec!["* 1 FETCH (FLAGS ())"],
        client.ok_command("STORE 1 -FLAGS ($Important)").await
    );
    assert!(setup.flags_of("INBOX", Uid::u(1)).is_empty());
}

#[tokio::test]
async fn replace_and_silent() {
    let setup = set_up();
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[Flag::Draft]);
    setup.add_message("INBOX", b"Subject: 2\r\n\r\n2", &[]);
    let mut client = selected_client(&setup).await;

    assert!(client
        .ok_command("STORE 1:2 FLAGS.SILENT (\\Seen)")
        .await
        .is_empty());
    assert_eq!(
        vec![
            "* 1 FETCH (FLAGS (\\Seen))",
            "* 2 FETCH (FLAGS (\\Seen))",
        ],
        client.ok_command("FETCH 1:2 FLAGS").await
    );

    assert_eq!(
        vec!["* 2 FETCH (FLAGS (\\Seen \\Deleted) UID 2)"],
        client.ok_command("UID STORE 2 +FLAGS (\\Deleted)").await
    );
    assert!(client
        .ok_command("UID STORE 1 -FLAGS.SILENT (\\Seen)")
        .await
        .is_empty());
    assert!(setup.flags_of("INBOX", Uid::u(1)).is_empty());
}

#[tokio::test]
async fn store_errors() {
    let setup = set_up();
    setup.add_message("INBOX", b"Subject: 1\r\n\r\n1", &[]);
    let mut client = selected_client(&setup).await;

    for (ix, command) in [
        "STORE 1 BOGUS (\\Seen)",
        "STORE 1 FLAGS \\Seen",
        "STORE x FLAGS (\\Seen)",
        "STORE 1 FLAGS",
    ]
    .iter()
    .enumerate()
    {
        assert_eq!(
            vec![format!("A{} BAD Error in arguments.", ix + 3)],
            client.command(command).await
        );
    }
}

#[tokio::test]
async fn store_stops_at_first_failure() {
    let setup = set_up();
    for subject in ["1", "2", "3"].iter() {
        setup.add_message(
            "INBOX",
            format!("Subject: {}\r\n\r\n{}", subject, subject).as_bytes(),
            &[],
        );
    }
    setup.fail_on("INBOX", Uid::u(2));
    let mut client = selected_client(&setup).await;

    let mut responses = client.command("STORE 1:3 +FLAGS (\\Flagged)").await;
    let tagged = responses.pop().unwrap();
    assert_eq!(vec!["* 1 FETCH (FLAGS (\\Flagged))"], responses);
    assert_eq!("A3 NO Simulated store failure.", tagged);

    assert!(setup.flags_of("INBOX", Uid::u(1)).contains(&Flag::Flagged));
    assert!(setup.flags_of("INBOX", Uid::u(2)).is_empty());
    assert!(setup.flags_of("INBOX", Uid::u(3)).is_empty());

    // The session's view matches the store
    assert_eq!(
        vec![
            "* 1 FETCH (FLAGS (\\Flagged))",
            "* 2 FETCH (FLAGS ())",
            "* 3 FETCH (FLAGS ())",
        ],
        client.ok_command("FETCH 1:3 FLAGS").await
    );
}
