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
    assert!(responses[0].split(' ').any(|cap| "ENABLE" == cap));
}

#[tokio::test]
async fn command_works() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    // Try to enable non-existent extension
    assert_eq!(
        vec!["* ENABLED"],
        client.ok_command("ENABLE RANDOMLY-LOSE").await
    );
    // Try to enable extension which cannot be enabled
    assert_eq!(vec!["* ENABLED"], client.ok_command("ENABLE ENABLE").await);

    // Mix valid and invalid extensions
    let responses = client
        .command("ENABLE RANDOMLY-LOSE utf8=accept ENABLE")
        .await;
    assert_eq!(
        vec!["* ENABLED UTF8=ACCEPT", "A4 OK ENABLE command completed."],
        responses
    );
}

#[tokio::test]
async fn utf8_accept_changes_rendering() {
    let setup = set_up();
    setup.add_message(
        "INBOX",
        "Subject: Grüße\r\n\r\nhi\r\n".as_bytes(),
        &[],
    );
    let mut client = setup.connect();
    quick_log_in(&mut client).await;
    quick_select(&mut client, "INBOX").await;

    assert_eq!(
        vec![
            "* 1 FETCH (ENVELOPE (NIL \"GrXXe\" NIL NIL NIL NIL NIL NIL NIL \
             NIL))"
        ],
        client.ok_command("FETCH 1 ENVELOPE").await
    );

    client.ok_command("ENABLE UTF8=ACCEPT").await;
    assert_eq!(
        vec![
            "* 1 FETCH (ENVELOPE (NIL \"Grüße\" NIL NIL NIL NIL NIL NIL NIL \
             NIL))"
        ],
        client.ok_command("FETCH 1 ENVELOPE").await
    );
}

#[tokio::test]
async fn enable_errors() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    assert_eq!(
        vec!["A1 NO Authentication required."],
        client.command("ENABLE UTF8=ACCEPT").await
    );

    client
        .ok_command(&format!("LOGIN {} {}", USER, PASSWORD))
        .await;
    assert_eq!(
        vec!["A3 BAD No arguments, or syntax error in an argument."],
        client.command("ENABLE").await
    );
    assert_eq!(
        vec!["A4 BAD No arguments, or syntax error in an argument."],
        client.command("ENABLE \"UTF8=ACCEPT\"").await
    );
}

#[tokio::test]
async fn disabled_without_capability() {
    let mut config = SystemConfig::default();
    config.capabilities.retain(|c| "ENABLE" != c);
    let setup = set_up_with(config);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["A2 NO Command 'ENABLE' not supported."],
        client.command("ENABLE UTF8=ACCEPT").await
    );
}
