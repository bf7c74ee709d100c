//! Remote data gateway contract.
//!
//! # Responsibility
//! - Define the request/response boundary between stores and the managed
//!   backend (auth provider + owner-scoped relational tables).
//! - Provide the session-change listener registry gateways fan out through.
//!
//! # Invariants
//! - Every call yields data or a [`GatewayError`], never both.
//! - Ownership (row-level security) is the gateway's job; callers must not
//!   assume a row is visible or mutable just because they hold its id.
//! - Session listeners receive every transition, including an initial
//!   `InitialSession` notification on registration.

mod error;
mod listeners;
pub mod sqlite;

pub use error::{codes, GatewayError, GatewayResult};
pub use listeners::{session_listener, SessionListener, SessionListeners, Subscription};

use crate::model::identity::{Identity, NewIdentity, UserId};
use crate::model::session::{AuthUser, Session};
use crate::model::subject::{Subject, SubjectId, SubjectInsert, SubjectPatch};
use crate::model::timetable::{
    ScheduledEntry, TimetableEntryId, TimetableEntryInsert, TimetableEntryPatch,
};
use async_trait::async_trait;

/// Result of an account registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResponse {
    pub user: Option<AuthUser>,
    /// Present when the provider signs new accounts in immediately.
    pub session: Option<Session>,
}

/// Ascending sort keys accepted by [`DataGateway::select_subjects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectOrder {
    Name,
}

/// Ascending sort keys accepted by [`DataGateway::select_timetable_entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    DayOfWeek,
    StartTime,
}

/// Authentication half of the gateway.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<SignUpResponse>;

    async fn sign_out(&self) -> GatewayResult<()>;

    async fn get_session(&self) -> GatewayResult<Option<Session>>;

    async fn get_user(&self) -> GatewayResult<Option<AuthUser>>;

    /// Deletes an account. Requires administrative privileges.
    async fn admin_delete_user(&self, user_id: UserId) -> GatewayResult<()>;

    /// Registers a session-change listener.
    ///
    /// The listener is invoked immediately with `InitialSession` and then on
    /// every later transition until the returned [`Subscription`] is dropped
    /// or unsubscribed.
    fn on_session_change(&self, listener: SessionListener) -> Subscription;
}

/// Owner-scoped table CRUD half of the gateway.
#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn insert_profile(&self, profile: &NewIdentity) -> GatewayResult<()>;

    async fn select_profile(&self, id: UserId) -> GatewayResult<Option<Identity>>;

    async fn select_subjects(&self, order_by: &[SubjectOrder]) -> GatewayResult<Vec<Subject>>;

    async fn insert_subject(&self, row: &SubjectInsert) -> GatewayResult<()>;

    async fn update_subject(&self, id: SubjectId, patch: &SubjectPatch) -> GatewayResult<()>;

    async fn delete_subject(&self, id: SubjectId) -> GatewayResult<()>;

    /// Reads entries joined with their subject's `{id, name, type}`.
    async fn select_timetable_entries(
        &self,
        order_by: &[EntryOrder],
    ) -> GatewayResult<Vec<ScheduledEntry>>;

    async fn insert_timetable_entry(&self, row: &TimetableEntryInsert) -> GatewayResult<()>;

    async fn update_timetable_entry(
        &self,
        id: TimetableEntryId,
        patch: &TimetableEntryPatch,
    ) -> GatewayResult<()>;

    async fn delete_timetable_entry(&self, id: TimetableEntryId) -> GatewayResult<()>;
}

/// Full gateway surface consumed by the stores.
pub trait Gateway: AuthGateway + DataGateway {}

impl<T: AuthGateway + DataGateway + ?Sized> Gateway for T {}
