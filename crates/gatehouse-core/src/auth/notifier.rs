//! Session change fan-out.
//!
//! Backends own a [`SessionNotifier`]; observers register a listener and
//! get back a [`Subscription`]. Dropping the subscription (or calling
//! [`Subscription::unsubscribe`]) removes the listener. The subscription
//! only holds a weak reference, so it never keeps a backend alive.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::SessionChange;

/// Callback invoked with every session change.
pub type SessionListener = Box<dyn Fn(&SessionChange) + Send + Sync>;

type SharedListener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, SharedListener)>,
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Listener registry owned by a backend.
#[derive(Clone, Default)]
pub struct SessionNotifier {
    registry: SharedRegistry,
}

impl SessionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: SessionListener) -> Subscription {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::from(listener)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `change` to every current listener, in subscription order.
    ///
    /// Listeners run outside the lock so they may subscribe or unsubscribe.
    pub fn notify(&self, change: &SessionChange) {
        let listeners: Vec<SharedListener> = lock(&self.registry)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::debug!(event = %change.event, listeners = listeners.len(), "session change");
        for listener in listeners {
            listener(change);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

impl fmt::Debug for SessionNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle for a registered listener. Unsubscribes on drop.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn release(&self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
