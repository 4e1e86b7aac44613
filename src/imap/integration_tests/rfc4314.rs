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
use crate::support::system_config::SystemConfig;

#[tokio::test]
async fn capability_declared() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    let responses = client.command("CAPABILITY").await;
    assert!(responses[0].split(' ').any(|cap| "ACL" == cap));
}

#[tokio::test]
async fn set_and_get_acl() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["* ACL INBOX", "A2 OK GETACL command completed."],
        client.command("GETACL INBOX").await
    );

    assert_eq!(
        vec!["A3 OK SETACL command completed."],
        client.command("SETACL INBOX fred lr").await
    );
    client.ok_command("SETACL INBOX fred +w").await;
    assert_eq!(
        vec!["* ACL INBOX \"fred\" \"lrw\""],
        client.ok_command("GETACL INBOX").await
    );

    client.ok_command("SETACL INBOX fred -l").await;
    client.ok_command("SETACL INBOX \"other user\" ae").await;
    assert_eq!(
        vec!["* ACL INBOX \"fred\" \"rw\" \"other user\" \"ae\""],
        client.ok_command("GETACL INBOX").await
    );

    assert_eq!(
        vec!["A9 OK DELETEACL command completed."],
        client.command("DELETEACL INBOX fred").await
    );
    assert_eq!(
        vec!["* ACL INBOX \"other user\" \"ae\""],
        client.ok_command("GETACL INBOX").await
    );
}

#[tokio::test]
async fn rights_queries() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec![
            "* LISTRIGHTS INBOX \"fred\" \"l\" r s w",
            "A2 OK LISTRIGHTS command completed.",
        ],
        client.command("LISTRIGHTS INBOX fred").await
    );
    assert_eq!(
        vec![
            "* MYRIGHTS \"INBOX\" \"lrswipkxtea\"",
            "A3 OK MYRIGHTS command completed.",
        ],
        client.command("MYRIGHTS INBOX").await
    );
}

#[tokio::test]
async fn acl_errors() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["A2 NO [NONEXISTENT] Mailbox does not exist."],
        client.command("GETACL nowhere").await
    );
    assert_eq!(
        vec!["A3 NO [NONEXISTENT] Mailbox does not exist."],
        client.command("SETACL nowhere fred lr").await
    );
    assert_eq!(
        vec!["A4 NO [NONEXISTENT] Mailbox does not exist."],
        client.command("MYRIGHTS nowhere").await
    );
    assert_eq!(
        vec!["A5 BAD Error in arguments."],
        client.command("SETACL INBOX fred").await
    );
    assert_eq!(
        vec!["A6 BAD Error in arguments."],
        client.command("DELETEACL INBOX").await
    );
}

#[tokio::test]
async fn disabled_without_capability() {
    let mut config = SystemConfig::default();
    config.capabilities.retain(|c| "ACL" != c);
    let setup = set_up_with(config);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    for command in &[
        "GETACL INBOX",
        "SETACL INBOX fred lr",
        "DELETEACL INBOX fred",
        "LISTRIGHTS INBOX fred",
        "MYRIGHTS INBOX",
    ] {
        let responses = client.command(command).await;
        assert_like(r"A[0-9]+ NO Command not supported\.", &responses[0]);
    }
}
