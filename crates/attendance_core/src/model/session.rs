//! Authenticated session shapes shared by the gateway and the session store.

use crate::model::identity::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Account as seen by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

/// Active authentication session for one account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token. Never logged.
    pub access_token: String,
    pub user: AuthUser,
    pub created_at: i64,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Session transition reported to change listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// Fired once when a listener registers, carrying the current session.
    InitialSession,
    SignedIn,
    SignedOut,
}

impl AuthChangeEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthUser, Session};
    use uuid::Uuid;

    #[test]
    fn debug_output_redacts_access_token() {
        let session = Session {
            access_token: "secret-token".to_string(),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: "student@example.com".to_string(),
            },
            created_at: 0,
        };

        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("student@example.com"));
    }
}
