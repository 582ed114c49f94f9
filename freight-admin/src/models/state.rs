// Application state (in-memory)
//
// Holds the signed-in session for the running process. Screens and fetchers
// receive it explicitly (see `api::client::RequestContext`); nothing reads the
// session store behind their back.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::responses::User;

/// Authenticated identity: bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn display_name(&self) -> &str {
        let name = self.user.full_name.trim();
        if name.is_empty() {
            self.user.email.as_str()
        } else {
            name
        }
    }

    pub fn greeting(&self) -> String {
        format!("Welcome back, {}", self.display_name())
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.eq_ignore_ascii_case("admin")
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    inner: Mutex<AppStateInner>,
}

#[derive(Debug, Default)]
struct AppStateInner {
    session: Option<Session>,
}

impl AppState {
    pub async fn set_session(&self, session: Session) {
        let mut inner = self.inner.lock().await;
        inner.session = Some(session);
    }

    pub async fn session(&self) -> Option<Session> {
        let inner = self.inner.lock().await;
        inner.session.clone()
    }

    pub async fn clear_session(&self) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        inner.session.take()
    }
}
