#![allow(dead_code)]

use async_trait::async_trait;
use attendance_core::gateway::{
    AuthGateway, DataGateway, EntryOrder, GatewayError, GatewayResult, SessionListener,
    SignUpResponse, SubjectOrder, Subscription,
};
use attendance_core::model::identity::{Identity, NewIdentity, UserId};
use attendance_core::model::session::{AuthUser, Session};
use attendance_core::model::subject::{Subject, SubjectId, SubjectInsert, SubjectPatch};
use attendance_core::model::timetable::{
    ScheduledEntry, TimetableEntryId, TimetableEntryInsert, TimetableEntryPatch,
};
use attendance_core::{AppContext, GatewayOptions, SqliteGateway};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "s3cret-pass";

/// Delegates to an in-memory [`SqliteGateway`], counting calls per
/// operation and optionally failing reads.
pub struct RecordingGateway {
    inner: SqliteGateway,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_selects: AtomicBool,
}

impl RecordingGateway {
    pub fn new(options: GatewayOptions) -> Self {
        Self {
            inner: SqliteGateway::open_in_memory(options).unwrap(),
            calls: Mutex::new(HashMap::new()),
            fail_selects: AtomicBool::new(false),
        }
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, Ordering::SeqCst);
    }

    fn record(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
    }

    fn select_guard(&self) -> GatewayResult<()> {
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(GatewayError::uncoded("network unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for RecordingGateway {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<Session> {
        self.record("sign_in_with_password");
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<SignUpResponse> {
        self.record("sign_up");
        self.inner.sign_up(email, password).await
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.record("sign_out");
        self.inner.sign_out().await
    }

    async fn get_session(&self) -> GatewayResult<Option<Session>> {
        self.record("get_session");
        self.inner.get_session().await
    }

    async fn get_user(&self) -> GatewayResult<Option<AuthUser>> {
        self.record("get_user");
        self.inner.get_user().await
    }

    async fn admin_delete_user(&self, user_id: UserId) -> GatewayResult<()> {
        self.record("admin_delete_user");
        self.inner.admin_delete_user(user_id).await
    }

    fn on_session_change(&self, listener: SessionListener) -> Subscription {
        self.record("on_session_change");
        self.inner.on_session_change(listener)
    }
}

#[async_trait]
impl DataGateway for RecordingGateway {
    async fn insert_profile(&self, profile: &NewIdentity) -> GatewayResult<()> {
        self.record("insert_profile");
        self.inner.insert_profile(profile).await
    }

    async fn select_profile(&self, id: UserId) -> GatewayResult<Option<Identity>> {
        self.record("select_profile");
        self.inner.select_profile(id).await
    }

    async fn select_subjects(&self, order_by: &[SubjectOrder]) -> GatewayResult<Vec<Subject>> {
        self.record("select_subjects");
        self.select_guard()?;
        self.inner.select_subjects(order_by).await
    }

    async fn insert_subject(&self, row: &SubjectInsert) -> GatewayResult<()> {
        self.record("insert_subject");
        self.inner.insert_subject(row).await
    }

    async fn update_subject(&self, id: SubjectId, patch: &SubjectPatch) -> GatewayResult<()> {
        self.record("update_subject");
        self.inner.update_subject(id, patch).await
    }

    async fn delete_subject(&self, id: SubjectId) -> GatewayResult<()> {
        self.record("delete_subject");
        self.inner.delete_subject(id).await
    }

    async fn select_timetable_entries(
        &self,
        order_by: &[EntryOrder],
    ) -> GatewayResult<Vec<ScheduledEntry>> {
        self.record("select_timetable_entries");
        self.select_guard()?;
        self.inner.select_timetable_entries(order_by).await
    }

    async fn insert_timetable_entry(&self, row: &TimetableEntryInsert) -> GatewayResult<()> {
        self.record("insert_timetable_entry");
        self.inner.insert_timetable_entry(row).await
    }

    async fn update_timetable_entry(
        &self,
        id: TimetableEntryId,
        patch: &TimetableEntryPatch,
    ) -> GatewayResult<()> {
        self.record("update_timetable_entry");
        self.inner.update_timetable_entry(id, patch).await
    }

    async fn delete_timetable_entry(&self, id: TimetableEntryId) -> GatewayResult<()> {
        self.record("delete_timetable_entry");
        self.inner.delete_timetable_entry(id).await
    }
}

pub fn recording_gateway(admin_privileges: bool) -> Arc<RecordingGateway> {
    Arc::new(RecordingGateway::new(GatewayOptions { admin_privileges }))
}

/// Starts a context over `gateway`.
pub async fn start(gateway: &Arc<RecordingGateway>) -> AppContext {
    AppContext::start(gateway.clone()).await.unwrap()
}

/// Starts a context and registers a signed-in account.
pub async fn signed_in(email: &str, roll_number: &str) -> (Arc<RecordingGateway>, AppContext) {
    let gateway = recording_gateway(false);
    let context = start(&gateway).await;
    context
        .session()
        .sign_up(email, PASSWORD, roll_number)
        .await
        .unwrap();
    (gateway, context)
}
