//! Session guard for protected entry points

use crate::error::{ChirpError, Result};
use crate::store::{TokenStore, User};

/// Where unauthenticated users are sent
pub const LOGIN_ENTRY_POINT: &str = "chirp login";

/// What a protected entry point needs from the session: who is looking and
/// the bearer credential for the post service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSession {
    pub user: User,
    pub access_token: String,
}

impl AuthorizedSession {
    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// Delete is offered only on the viewer's own posts
    pub fn owns(&self, author: &str) -> bool {
        self.user.username == author
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Authorized(AuthorizedSession),
    Redirect { to: &'static str },
}

pub struct SessionGuard;

impl SessionGuard {
    /// Authorized only when both the user record and the access token are stored
    pub fn check(store: &TokenStore) -> GuardOutcome {
        match (store.current_user(), store.access_token()) {
            (Some(user), Some(access_token)) => {
                GuardOutcome::Authorized(AuthorizedSession { user, access_token })
            }
            _ => {
                tracing::debug!("no stored session, redirecting to login");
                GuardOutcome::Redirect {
                    to: LOGIN_ENTRY_POINT,
                }
            }
        }
    }

    /// [`SessionGuard::check`] for callers that stop on redirect
    pub fn require(store: &TokenStore) -> Result<AuthorizedSession> {
        match Self::check(store) {
            GuardOutcome::Authorized(session) => Ok(session),
            GuardOutcome::Redirect { to } => Err(ChirpError::session_not_found(format!(
                "Please log in first with `{}`",
                to
            ))),
        }
    }
}
