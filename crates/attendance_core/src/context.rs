//! Composition root wiring the stores to one gateway.
//!
//! # Responsibility
//! - Own the three stores for the application's lifetime.
//! - Hydrate the session at startup and own the session-change
//!   subscription until shutdown.
//!
//! # Invariants
//! - Stores are reachable only through this context; there are no
//!   process-wide singletons.
//! - The subscription holds a weak reference to the session store, so the
//!   gateway never keeps the context alive.

use crate::gateway::{session_listener, Gateway, Subscription};
use crate::store::session::SessionStore;
use crate::store::subjects::SubjectsStore;
use crate::store::timetable::TimetableStore;
use crate::store::StoreResult;
use log::{debug, info};
use std::sync::Arc;

/// Application context handed to the view layer at startup.
pub struct AppContext {
    session: Arc<SessionStore>,
    subjects: SubjectsStore,
    timetable: TimetableStore,
    subscription: Option<Subscription>,
}

impl AppContext {
    /// Builds the stores, hydrates the session and subscribes to changes.
    pub async fn start(gateway: Arc<dyn Gateway>) -> StoreResult<Self> {
        let session = Arc::new(SessionStore::new(Arc::clone(&gateway)));
        let initial = gateway.get_session().await?;
        session.set_session(initial);

        let weak_session = Arc::downgrade(&session);
        let subscription = gateway.on_session_change(session_listener(move |event, current| {
            if let Some(store) = weak_session.upgrade() {
                debug!(
                    "event=session_change module=context status=ok auth_event={}",
                    event.as_str()
                );
                store.set_session(current.cloned());
            }
        }));

        info!(
            "event=context_start module=context status=ok signed_in={}",
            session.is_signed_in()
        );

        Ok(Self {
            subjects: SubjectsStore::new(Arc::clone(&gateway)),
            timetable: TimetableStore::new(gateway),
            session,
            subscription: Some(subscription),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn subjects(&self) -> &SubjectsStore {
        &self.subjects
    }

    pub fn timetable(&self) -> &TimetableStore {
        &self.timetable
    }

    /// Tears down the session-change subscription.
    pub fn shutdown(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        info!("event=context_shutdown module=context status=ok");
    }
}
