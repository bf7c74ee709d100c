//! Session-change listener registry and subscription handles.

use crate::model::session::{AuthChangeEvent, Session};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked on every session transition.
pub type SessionListener = Arc<dyn Fn(AuthChangeEvent, Option<&Session>) + Send + Sync>;

/// Wraps a closure as a [`SessionListener`].
pub fn session_listener(
    listener: impl Fn(AuthChangeEvent, Option<&Session>) + Send + Sync + 'static,
) -> SessionListener {
    Arc::new(listener)
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: BTreeMap<u64, SessionListener>,
}

/// Registry that gateway implementations notify on session transitions.
///
/// Listeners are invoked outside the registry lock, so a listener may
/// subscribe or unsubscribe while being notified.
#[derive(Clone, Default)]
pub struct SessionListeners {
    inner: Arc<Mutex<ListenerTable>>,
}

impl SessionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: SessionListener) -> Subscription {
        let id = {
            let mut table = lock_table(&self.inner);
            let id = table.next_id;
            table.next_id += 1;
            table.listeners.insert(id, listener);
            id
        };

        let registry = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                lock_table(&inner).listeners.remove(&id);
            }
        })
    }

    pub fn notify(&self, event: AuthChangeEvent, session: Option<&Session>) {
        let listeners = lock_table(&self.inner)
            .listeners
            .values()
            .cloned()
            .collect::<Vec<_>>();

        log::debug!(
            "event=session_notify module=gateway status=ok auth_event={} listeners={}",
            event.as_str(),
            listeners.len()
        );
        for listener in listeners {
            listener(event, session);
        }
    }

    pub fn len(&self) -> usize {
        lock_table(&self.inner).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_table(inner: &Mutex<ListenerTable>) -> MutexGuard<'_, ListenerTable> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for one registered listener; unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
