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
    assert!(responses[0].split(' ').any(|cap| "QUOTA" == cap));
}

#[tokio::test]
async fn get_quota_root() {
    let setup = set_up();
    setup.add_message("INBOX", &message_of_size("Big", 4096), &[]);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec![
            "* QUOTAROOT INBOX \"\"",
            "* QUOTA \"\" (STORAGE 4 1024)",
            "A2 OK GETQUOTAROOT command completed.",
        ],
        client.command("GETQUOTAROOT INBOX").await
    );
}

#[tokio::test]
async fn get_quota() {
    let setup = set_up();
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["* QUOTA \"\" (STORAGE 0 1024)", "A2 OK QUOTA command completed."],
        client.command("GETQUOTA \"\"").await
    );
    assert_eq!(
        vec!["A3 NO No such quota root."],
        client.command("GETQUOTA elsewhere").await
    );
    assert_eq!(
        vec!["A4 BAD Error in arguments."],
        client.command("GETQUOTA").await
    );
}

#[tokio::test]
async fn requires_authentication() {
    let setup = set_up();
    let mut client = setup.connect();
    skip_greeting(&mut client).await;

    assert_eq!(
        vec!["A1 NO Authentication required."],
        client.command("GETQUOTAROOT INBOX").await
    );
}

#[tokio::test]
async fn disabled_without_capability() {
    let mut config = SystemConfig::default();
    config.capabilities.retain(|c| "QUOTA" != c);
    let setup = set_up_with(config);
    let mut client = setup.connect();
    quick_log_in(&mut client).await;

    assert_eq!(
        vec!["A2 NO Command not supported."],
        client.command("GETQUOTAROOT INBOX").await
    );
    assert_eq!(
        vec!["A3 NO Command not supported."],
        client.command("GETQUOTA \"\"").await
    );
}
