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
use crate::support::system_config::SystemConfig;

#[tokio::test]
async fn greeting_and_capabilities() {
    let setup = set_up();
    let mut client = setup.connect();

    assert_eq!(
        "* OK localhost IMAP4rev1 server ready.",
        client.read_line().await.unwrap()
    );

    let responses = client.command("CAPABILITY").await;
    assert_eq!(
        vec![
            "* CAPABILITY IMAP4rev1 NAMESPACE QUOTA ACL IDLE ENABLE \
             UTF8=ACCEPT SASL-IR AUTH=PLAIN",
            "A1 OK CAPABILITY completed.",
        ],
        responses
    );
}

#[tokio::test]
async fn custom_greeting() {
    let setup = set_up_with(SystemConfig {
        host_name: "mx.example.com".to_owned(),
        ..SystemConfig::default()
    });
    let mut client = setup.connect();
    assert_eq!(
        "* OK mx.example.com IMAP4rev1 server ready.",
        client.read_line().await.unwrap()
    );

    let setup = set_up_with(SystemConfig {
        greeting: "Hello there.".to_owned(),
        ..SystemConfig::default()
    });
    let mut client = setup.connect();
    assert_eq!("* OK Hello there.", client.read_line().await.unwrap());
}

#[tokio::test]
async fn start_tls() {
    let mut setup = set_up();
    setup.tls_available = true;
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    let responses = client.command("CAPABILITY").await;
    assert!(responses[0].starts_with("* CAPABILITY STARTTLS IMAP4rev1 "));

    assert_eq!(
        vec!["A2 OK Begin TLS negotiation now."],
        client.command("STARTTLS").await
    );

    let responses = client.command("CAPABILITY").await;
    assert!(!responses[0].contains("STARTTLS"));

    assert_eq!(
        vec!["A4 NO Bad sequence of commands: Connection is already secure."],
        client.command("STARTTLS").await
    );

    // The session keeps working after the handshake
    assert_tagged_ok(&client.command(&format!("LOGIN {} {}", USER, PASSWORD)).await[0]);
}

#[tokio::test]
async fn start_tls_unavailable() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    let responses = client.command("CAPABILITY").await;
    assert!(!responses[0].contains("STARTTLS"));

    assert_eq!(
        vec!["A2 NO TLS not available: Server has no SSL certificate."],
        client.command("STARTTLS").await
    );
}

#[tokio::test]
async fn start_tls_after_login() {
    let mut setup = set_up();
    setup.tls_available = true;
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["A2 NO This ommand is only valid in not-authenticated state."],
        client.command("STARTTLS").await
    );
}

#[tokio::test]
async fn logout() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["* BYE IMAP4rev1 Server logging out.", "A2 OK LOGOUT completed."],
        client.command("LOGOUT").await
    );
    assert_eq!(None, client.read_line().await);
}

#[tokio::test]
async fn logout_before_login() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    assert_eq!(
        vec!["* BYE IMAP4rev1 Server logging out.", "A1 OK LOGOUT completed."],
        client.command("LOGOUT").await
    );
    assert_eq!(None, client.read_line().await);
}

#[tokio::test(start_paused = true)]
async fn idle_timeout() {
    let setup = set_up_with(SystemConfig {
        idle_timeout_secs: 60,
        ..SystemConfig::default()
    });
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        "* BYE Idle timeout, closing connection.",
        client.read_line().await.unwrap()
    );
    assert_eq!(None, client.read_line().await);
}

#[tokio::test]
async fn closed_by_handle() {
    let setup = set_up();
    let (mut client, handle) = setup.connect_with_handle();
    quick_log_in(&mut client).await;

    handle.close("Server shutting down.");
    assert_eq!(
        "* BYE Server shutting down.",
        client.read_line().await.unwrap()
    );
    assert_eq!(None, client.read_line().await);
}

#[tokio::test]
async fn closed_by_watchdog() {
    let setup = set_up();
    let (mut client, handle) = setup.connect_with_handle();
    skip_greeting(&mut client).await;

    handle.idle_timeout();
    assert_eq!(
        "* BYE Idle timeout, closing connection.",
        client.read_line().await.unwrap()
    );
    assert_eq!(None, client.read_line().await);
}
