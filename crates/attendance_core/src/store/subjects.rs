//! Subjects store: the signed-in account's subject list.
//!
//! # Invariants
//! - `items` is ordered ascending by name, as returned by the gateway.
//! - `create_subject` never reaches the gateway's insert without an owner.

use super::{begin, settle, ListState, StoreError, StoreResult};
use crate::gateway::{Gateway, SubjectOrder};
use crate::model::subject::{NewSubject, Subject, SubjectId, SubjectPatch};
use std::sync::Arc;
use tokio::sync::watch;

const MODULE: &str = "subjects_store";

pub type SubjectsState = ListState<Subject>;

/// Observable subject list mediated through the gateway.
pub struct SubjectsStore {
    gateway: Arc<dyn Gateway>,
    state: watch::Sender<SubjectsState>,
}

impl SubjectsStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (state, _) = watch::channel(SubjectsState::default());
        Self { gateway, state }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SubjectsState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SubjectsState> {
        self.state.subscribe()
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.state.borrow().items.clone()
    }

    /// Replaces the list with the gateway's subjects ordered by name.
    pub async fn fetch_subjects(&self) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.reload().await;
        settle(&self.state, MODULE, "subjects_fetch", started_at, result)
    }

    /// Inserts a subject owned by the signed-in account, then re-fetches.
    ///
    /// Fails with [`StoreError::AuthenticationRequired`] before any write
    /// when nobody is signed in.
    pub async fn create_subject(&self, subject: NewSubject) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.insert_and_reload(subject).await;
        settle(&self.state, MODULE, "subjects_create", started_at, result)
    }

    /// Applies a partial update by id, then re-fetches.
    ///
    /// An empty patch writes nothing but still re-fetches.
    pub async fn update_subject(&self, id: SubjectId, patch: SubjectPatch) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.update_and_reload(id, &patch).await;
        settle(&self.state, MODULE, "subjects_update", started_at, result)
    }

    pub async fn delete_subject(&self, id: SubjectId) -> StoreResult<()> {
        let started_at = begin(&self.state);
        let result = self.delete_and_reload(id).await;
        settle(&self.state, MODULE, "subjects_delete", started_at, result)
    }

    async fn insert_and_reload(&self, subject: NewSubject) -> StoreResult<()> {
        let user = self
            .gateway
            .get_user()
            .await?
            .ok_or(StoreError::AuthenticationRequired)?;
        self.gateway
            .insert_subject(&subject.owned_by(user.id))
            .await?;
        self.reload().await
    }

    async fn update_and_reload(&self, id: SubjectId, patch: &SubjectPatch) -> StoreResult<()> {
        self.gateway.update_subject(id, patch).await?;
        self.reload().await
    }

    async fn delete_and_reload(&self, id: SubjectId) -> StoreResult<()> {
        self.gateway.delete_subject(id).await?;
        self.reload().await
    }

    async fn reload(&self) -> StoreResult<()> {
        let subjects = self.gateway.select_subjects(&[SubjectOrder::Name]).await?;
        self.state.send_modify(|state| state.items = subjects);
        Ok(())
    }
}
