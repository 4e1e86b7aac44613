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

use std::fmt;
use std::sync::{Arc, Mutex};

/// Tracks text that should be included in at the start of every log statement.
///
/// Clones of a `LogPrefix` share the same underlying data, so the IDLE tick,
/// the response pipeline's error handler and the command processor all log
/// under the same identity once the user has logged in.
#[derive(Clone)]
pub struct LogPrefix {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Clone, Default)]
struct Inner {
    protocol: String,
    peer: Option<String>,
    user: Option<String>,
    secure: bool,
}

impl LogPrefix {
    pub fn new(protocol: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                protocol,
                ..Inner::default()
            })),
        }
    }

    pub fn set_peer(&self, peer: String) {
        self.with(|inner| inner.peer = Some(sanitise(peer)));
    }

    pub fn set_user(&self, user: String) {
        self.with(|inner| inner.user = Some(sanitise(user)));
    }

    pub fn set_secure(&self) {
        self.with(|inner| inner.secure = true);
    }

    fn with(&self, f: impl FnOnce(&mut Inner)) {
        // A poisoned prefix is still better than a panic while logging.
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut inner);
    }
}

impl fmt::Display for LogPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = match self.inner.lock() {
            Ok(inner) => inner.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        write!(f, "{}", inner.protocol)?;
        if inner.secure {
            write!(f, "s")?;
        }

        if inner.peer.is_some() || inner.user.is_some() {
            write!(f, "[")?;
            if let Some(ref user) = inner.user {
                write!(f, "{user}")?;
                if inner.peer.is_some() {
                    write!(f, " ")?;
                }
            }
            if let Some(ref peer) = inner.peer {
                write!(f, "from={peer}")?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

fn sanitise(mut s: String) -> String {
    s.retain(|c| !c.is_control());
    if let Some((truncate_len, _)) = s.char_indices().nth(64) {
        s.truncate(truncate_len);
    }

    s
}
