//! Client-side stores synchronized with the data gateway.
//!
//! # Responsibility
//! - Hold observable `{data, loading, error}` state per concern.
//! - Mediate every create/update/delete through the gateway.
//!
//! # Invariants
//! - Lists are replaced wholesale by a fresh gateway read after every
//!   successful mutation; they are never patched in memory.
//! - Failures are recorded in `error` and leave prior data untouched.
//! - `error` is cleared when the next operation starts, not when it ends.
//! - No lock is held across an await; concurrent operations interleave and
//!   the last one to settle owns `loading`/`error`.

pub mod session;
pub mod subjects;
pub mod timetable;

use crate::gateway::GatewayError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use tokio::sync::watch;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure surfaced by a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A mutation needing an owner ran without a signed-in account.
    AuthenticationRequired,
    /// Any failure reported by the gateway, message kept verbatim.
    Gateway(GatewayError),
    /// Sign-up's account rollback failed after the profile insert failed.
    ///
    /// The account exists without an identity. Displays the original failure.
    CompensationFailed {
        original: GatewayError,
        compensation: GatewayError,
    },
}

impl StoreError {
    /// Stable code for logs and callers that branch on failure family.
    pub fn code(&self) -> &str {
        match self {
            Self::AuthenticationRequired => "auth_required",
            Self::Gateway(err) => err.code().unwrap_or("gateway"),
            Self::CompensationFailed { .. } => "compensation_failed",
        }
    }

    /// The gateway failure that caused this error, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::AuthenticationRequired => None,
            Self::Gateway(err) => Some(err),
            Self::CompensationFailed { original, .. } => Some(original),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationRequired => write!(f, "User not authenticated"),
            Self::Gateway(err) => write!(f, "{err}"),
            Self::CompensationFailed { original, .. } => write!(f, "{original}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AuthenticationRequired => None,
            Self::Gateway(err) => Some(err),
            Self::CompensationFailed { original, .. } => Some(original),
        }
    }
}

impl From<GatewayError> for StoreError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

/// Coarse lifecycle of a list store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Idle,
    Loading,
    Error,
}

/// Observable state of a gateway-backed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> ListState<T> {
    pub fn status(&self) -> StoreStatus {
        if self.loading {
            StoreStatus::Loading
        } else if self.error.is_some() {
            StoreStatus::Error
        } else {
            StoreStatus::Idle
        }
    }
}

/// Marks an operation as started: `loading=true`, previous error cleared.
fn begin<T>(state: &watch::Sender<ListState<T>>) -> Instant {
    state.send_modify(|state| {
        state.loading = true;
        state.error = None;
    });
    Instant::now()
}

/// Records the outcome of an operation and clears `loading`.
fn settle<T>(
    state: &watch::Sender<ListState<T>>,
    module: &'static str,
    event: &'static str,
    started_at: Instant,
    result: StoreResult<()>,
) -> StoreResult<()> {
    state.send_modify(|state| {
        if let Err(err) = &result {
            state.error = Some(err.to_string());
        }
        state.loading = false;
    });

    match &result {
        Ok(()) => info!(
            "event={event} module={module} status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module={module} status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}
