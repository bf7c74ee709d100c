//! Timetable store: the signed-in account's weekly entries.
//!
//! # Invariants
//! - `items` is ordered by day of week, then start time.
//! - Each entry carries its subject's `{id, name, type}` so views never
//!   cross-reference the subjects store.

use super::{begin, settle, ListState, StoreError, StoreResult};
use crate::gateway::{EntryOrder, Gateway};
use crate::model::timetable::{
    NewTimetableEntry, ScheduledEntry, TimetableEntryId, TimetableEntryPatch,
};
use std::sync::Arc;
use tokio::sync::watch;

const MODULE: &str = "timetable_store";
const ENTRY_ORDER: [EntryOrder; 2] = [EntryOrder::DayOfWeek, EntryOrder::StartTime];

pub type TimetableState = ListState<ScheduledEntry>;

/// Observable timetable mediated through the gateway.
pub struct TimetableStore {
    gateway: Arc<dyn Gateway>,
    state: watch::Sender<TimetableState>,
}

impl TimetableStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (state, _) = watch::channel(TimetableState::default());
        Self { gateway, state }
    }

    pub fn snapshot(&self) -> TimetableState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimetableState> {
        self.state.subscribe()
    }

    pub fn entries(&self) -> Vec<ScheduledEntry> {
        self.state.borrow().items.clone()
    }

    pub async fn fetch_entries(&self) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.reload().await;
        settle(&self.state, MODULE, "timetable_fetch", started_at, result)
    }

    /// Inserts an entry owned by the signed-in account, then re-fetches.
    pub async fn create_entry(&self, entry: NewTimetableEntry) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.insert_and_reload(entry).await;
        settle(&self.state, MODULE, "timetable_create", started_at, result)
    }

    pub async fn update_entry(
        &self,
        id: TimetableEntryId,
        patch: TimetableEntryPatch,
    ) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.update_and_reload(id, &patch).await;
        settle(&self.state, MODULE, "timetable_update", started_at, result)
    }

    pub async fn delete_entry(&self, id: TimetableEntryId) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.delete_and_reload(id).await;
        settle(&self.state, MODULE, "timetable_delete", started_at, result)
    }

    async fn insert_and_reload(&self, entry: NewTimetableEntry) -> StoreResult<()> {
        let user = self
            .gateway
            .get_user()
            .await?
            .ok_or(StoreError::AuthenticationRequired)?;
        self.gateway
            .insert_timetable_entry(&entry.owned_by(user.id))
            .await?;
        self.reload().await
    }

    async fn update_and_reload(
        &self,
        id: TimetableEntryId,
        patch: &TimetableEntryPatch,
    ) -> StoreResult<()> {
        self.gateway.update_timetable_entry(id, patch).await?;
        self.reload().await
    }

    async fn delete_and_reload(&self, id: TimetableEntryId) -> StoreResult<()> {
        self.gateway.delete_timetable_entry(id).await?;
        self.reload().await
    }

    async fn reload(&self) -> StoreResult<()> {
        let entries = self.gateway.select_timetable_entries(&ENTRY_ORDER).await?;
        self.state.send_modify(|state| state.items = entries);
        Ok(())
    }
}
