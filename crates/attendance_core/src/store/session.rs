//! Session store: the current authenticated session.
//!
//! # Responsibility
//! - Expose the current session (or none) to views.
//! - Forward sign-in/sign-up/sign-out intents to the gateway.
//! - Look up the signed-in account's identity record.
//!
//! # Invariants
//! - `set_session` is the only state mutation besides a successful
//!   `sign_out`; sign-in results arrive through the gateway's change
//!   notification, not through `sign_in` itself.
//! - `loading` stays true until the first `set_session` (hydration).
//! - Sign-up is two gateway writes without atomicity. A failed identity
//!   insert triggers a best-effort account deletion, which needs an
//!   administrative gateway context.

use super::{StoreError, StoreResult};
use crate::gateway::{codes, Gateway, GatewayError};
use crate::model::identity::{Identity, NewIdentity, UserId};
use crate::model::session::Session;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,
    /// True until the session has been hydrated once.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

pub struct SessionStore {
    gateway: Arc<dyn Gateway>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { gateway, state }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().session.is_some()
    }

    /// Replaces the local session. Called by startup hydration and the
    /// gateway change subscription only.
    pub fn set_session(&self, session: Option<Session>) {
        debug!(
            "event=session_set module=session_store status=ok signed_in={}",
            session.is_some()
        );
        self.state.send_modify(|state| {
            state.session = session;
            state.loading = false;
        });
    }

    /// Forwards credentials to the gateway.
    ///
    /// Gateway failures are returned verbatim. State is left untouched; the
    /// gateway's `SignedIn` notification delivers the new session.
    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<()> {
        let started_at = Instant::now();
        match self.gateway.sign_in_with_password(email, password).await {
            Ok(session) => {
                info!(
                    "event=sign_in module=session_store status=ok user_id={} duration_ms={}",
                    session.user.id,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=sign_in module=session_store status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code().unwrap_or("none"),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Creates an account and its identity record.
    ///
    /// When the identity insert fails the just-created account is deleted
    /// and the insert failure is returned. If that deletion also fails the
    /// result is [`StoreError::CompensationFailed`], which still displays
    /// the original failure.
    pub async fn sign_up(&self, email: &str, password: &str, roll_number: &str) -> StoreResult<()> {
        let started_at = Instant::now();
        let response = self.gateway.sign_up(email, password).await.map_err(|err| {
            warn!(
                "event=sign_up module=session_store status=error stage=account error_code={} error={}",
                err.code().unwrap_or("none"),
                err
            );
            StoreError::Gateway(err)
        })?;

        let user = response.user.ok_or_else(|| {
            StoreError::Gateway(GatewayError::new(
                codes::USER_NOT_FOUND,
                "User was not returned from signUp",
            ))
        })?;
        info!(
            "event=sign_up module=session_store status=account_created user_id={}",
            user.id
        );

        let identity = NewIdentity {
            id: user.id,
            roll_number: roll_number.to_string(),
        };
        if let Err(original) = self.gateway.insert_profile(&identity).await {
            error!(
                "event=sign_up module=session_store status=error stage=profile user_id={} error_code={} error={}",
                user.id,
                original.code().unwrap_or("none"),
                original
            );
            return Err(self.compensate_sign_up(user.id, original).await);
        }

        info!(
            "event=sign_up module=session_store status=ok user_id={} duration_ms={}",
            user.id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    async fn compensate_sign_up(&self, user_id: UserId, original: GatewayError) -> StoreError {
        match self.gateway.admin_delete_user(user_id).await {
            Ok(()) => {
                warn!(
                    "event=sign_up_rollback module=session_store status=ok user_id={}",
                    user_id
                );
                StoreError::Gateway(original)
            }
            Err(compensation) => {
                error!(
                    "event=sign_up_rollback module=session_store status=error orphaned_user_id={} error_code={} error={}",
                    user_id,
                    compensation.code().unwrap_or("none"),
                    compensation
                );
                StoreError::CompensationFailed {
                    original,
                    compensation,
                }
            }
        }
    }

    /// Ends the gateway session and clears local state on success.
    pub async fn sign_out(&self) -> StoreResult<()> {
        match self.gateway.sign_out().await {
            Ok(()) => {
                info!("event=sign_out module=session_store status=ok");
                self.set_session(None);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=sign_out module=session_store status=error error_code={} error={}",
                    err.code().unwrap_or("none"),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Identity record of the signed-in account; `None` when signed out or
    /// when the record is missing.
    pub async fn profile(&self) -> StoreResult<Option<Identity>> {
        let Some(session) = self.session() else {
            return Ok(None);
        };
        self.gateway
            .select_profile(session.user.id)
            .await
            .map_err(|err| {
                warn!(
                    "event=profile_fetch module=session_store status=error error_code={} error={}",
                    err.code().unwrap_or("none"),
                    err
                );
                err.into()
            })
    }
}
