//! SQLite-backed gateway embodying the managed backend locally.
//!
//! # Responsibility
//! - Serve the auth and table contracts from one SQLite database.
//! - Persist the client session so a restarted process can hydrate it.
//! - Enforce row ownership the way the hosted backend's policies do.
//!
//! # Invariants
//! - The connection lock is never held across an await point or while
//!   hashing passwords or notifying listeners.
//! - Account deletion is refused unless the gateway was opened with
//!   administrative privileges.

mod auth;
mod tables;

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::gateway::{
    codes, AuthGateway, DataGateway, EntryOrder, GatewayError, GatewayResult, SessionListener,
    SessionListeners, SignUpResponse, SubjectOrder, Subscription,
};
use crate::model::identity::{Identity, NewIdentity, UserId};
use crate::model::session::{AuthChangeEvent, AuthUser, Session};
use crate::model::subject::{Subject, SubjectId, SubjectInsert, SubjectPatch};
use crate::model::timetable::{
    ScheduledEntry, TimetableEntryId, TimetableEntryInsert, TimetableEntryPatch,
};
use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Capabilities granted to the gateway client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Allows `admin_delete_user`; a privileged (service) context only.
    pub admin_privileges: bool,
}

/// Local gateway over one SQLite connection.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
    listeners: SessionListeners,
    options: GatewayOptions,
}

impl SqliteGateway {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>, options: GatewayOptions) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?, options))
    }

    pub fn open_in_memory(options: GatewayOptions) -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, options))
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(conn: Connection, options: GatewayOptions) -> Self {
        Self {
            conn: Mutex::new(conn),
            listeners: SessionListeners::new(),
            options,
        }
    }

    pub fn options(&self) -> GatewayOptions {
        self.options
    }

    fn with_conn<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Connection) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let started_at = Instant::now();
        let result = {
            let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut *conn)
        };

        match &result {
            Ok(_) => debug!(
                "event=gateway_call module=gateway op={op} status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=gateway_call module=gateway op={op} status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code().unwrap_or("none"),
                err
            ),
        }
        result
    }

    /// Runs an owner-scoped table operation as the signed-in account.
    fn as_owner<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Connection, Option<UserId>) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        self.with_conn(op, |conn| {
            let owner = auth::current_user_id(conn)?;
            f(conn, owner)
        })
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[async_trait]
impl AuthGateway for SqliteGateway {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<Session> {
        let email = auth::normalize_email(email).map_err(|_| auth::invalid_credentials())?;
        let account = self
            .with_conn("sign_in_lookup", |conn| auth::find_account(conn, &email))?
            .ok_or_else(auth::invalid_credentials)?;
        auth::verify_password(password, &account.password_hash)?;

        let session = self.with_conn("sign_in", |conn| auth::start_session(conn, account.user))?;
        self.listeners
            .notify(AuthChangeEvent::SignedIn, Some(&session));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<SignUpResponse> {
        let email = auth::normalize_email(email)?;
        auth::check_password_strength(password)?;
        let password_hash = auth::hash_password(password)?;

        let session = self.with_conn("sign_up", |conn| {
            let tx = conn.transaction()?;
            let user = auth::create_account(&tx, &email, &password_hash)?;
            let session = auth::start_session(&tx, user)?;
            tx.commit()?;
            Ok(session)
        })?;

        self.listeners
            .notify(AuthChangeEvent::SignedIn, Some(&session));
        Ok(SignUpResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let ended = self.with_conn("sign_out", |conn| auth::end_session(conn))?;
        if ended {
            self.listeners.notify(AuthChangeEvent::SignedOut, None);
        }
        Ok(())
    }

    async fn get_session(&self) -> GatewayResult<Option<Session>> {
        self.with_conn("get_session", |conn| auth::current_session(conn))
    }

    async fn get_user(&self) -> GatewayResult<Option<AuthUser>> {
        Ok(self.get_session().await?.map(|session| session.user))
    }

    async fn admin_delete_user(&self, user_id: UserId) -> GatewayResult<()> {
        if !self.options.admin_privileges {
            return Err(GatewayError::new(codes::NOT_ADMIN, "User not allowed"));
        }

        let was_current = self.with_conn("admin_delete_user", |conn| {
            let tx = conn.transaction()?;
            let was_current = auth::current_user_id(&tx)? == Some(user_id);
            auth::delete_account(&tx, user_id)?;
            tx.commit()?;
            Ok(was_current)
        })?;

        if was_current {
            self.listeners.notify(AuthChangeEvent::SignedOut, None);
        }
        Ok(())
    }

    fn on_session_change(&self, listener: SessionListener) -> Subscription {
        let subscription = self.listeners.subscribe(listener.clone());
        let current = self
            .with_conn("initial_session", |conn| auth::current_session(conn))
            .unwrap_or_else(|err| {
                warn!(
                    "event=initial_session module=gateway status=error error={}",
                    err
                );
                None
            });
        listener(AuthChangeEvent::InitialSession, current.as_ref());
        subscription
    }
}

#[async_trait]
impl DataGateway for SqliteGateway {
    async fn insert_profile(&self, profile: &NewIdentity) -> GatewayResult<()> {
        self.as_owner("insert_profile", |conn, owner| {
            tables::insert_profile(conn, owner, profile)
        })
    }

    async fn select_profile(&self, id: UserId) -> GatewayResult<Option<Identity>> {
        self.as_owner("select_profile", |conn, owner| {
            tables::select_profile(conn, owner, id)
        })
    }

    async fn select_subjects(&self, order_by: &[SubjectOrder]) -> GatewayResult<Vec<Subject>> {
        self.as_owner("select_subjects", |conn, owner| {
            tables::select_subjects(conn, owner, order_by)
        })
    }

    async fn insert_subject(&self, row: &SubjectInsert) -> GatewayResult<()> {
        self.as_owner("insert_subject", |conn, owner| {
            tables::insert_subject(conn, owner, row)
        })
    }

    async fn update_subject(&self, id: SubjectId, patch: &SubjectPatch) -> GatewayResult<()> {
        self.as_owner("update_subject", |conn, owner| {
            tables::update_subject(conn, owner, id, patch)
        })
    }

    async fn delete_subject(&self, id: SubjectId) -> GatewayResult<()> {
        self.as_owner("delete_subject", |conn, owner| {
            tables::delete_subject(conn, owner, id)
        })
    }

    async fn select_timetable_entries(
        &self,
        order_by: &[EntryOrder],
    ) -> GatewayResult<Vec<ScheduledEntry>> {
        self.as_owner("select_timetable_entries", |conn, owner| {
            tables::select_timetable_entries(conn, owner, order_by)
        })
    }

    async fn insert_timetable_entry(&self, row: &TimetableEntryInsert) -> GatewayResult<()> {
        self.as_owner("insert_timetable_entry", |conn, owner| {
            tables::insert_timetable_entry(conn, owner, row)
        })
    }

    async fn update_timetable_entry(
        &self,
        id: TimetableEntryId,
        patch: &TimetableEntryPatch,
    ) -> GatewayResult<()> {
        self.as_owner("update_timetable_entry", |conn, owner| {
            tables::update_timetable_entry(conn, owner, id, patch)
        })
    }

    async fn delete_timetable_entry(&self, id: TimetableEntryId) -> GatewayResult<()> {
        self.as_owner("delete_timetable_entry", |conn, owner| {
            tables::delete_timetable_entry(conn, owner, id)
        })
    }
}
