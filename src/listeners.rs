//! Listener registry: broadcast of (key, text-or-cleared) events.
//!
//! Subscriptions are global, not per-key — every listener receives every
//! publish and filters by key itself. This mirrors how the consuming UI
//! works: one accessory component per message subscribes once and ignores
//! events for other messages.
//!
//! `publish` is the single point of truth update: it writes the cache first
//! (set on text, clear on `None`) and then fans the event out to a snapshot
//! of the listeners taken at publish time. Snapshotting keeps iteration
//! resilient to concurrent subscribe/unsubscribe: a listener removed during
//! a publish in progress may still observe that publish, but removal never
//! panics and never affects delivery to the other listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::cache::ResultCache;
use crate::key::MessageId;

/// Callback invoked with `(key, Some(text))` on updates and `(key, None)` on clears.
pub type ListenerFn = dyn Fn(&MessageId, Option<&str>) + Send + Sync;

struct ListenerSet {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<u64, Arc<ListenerFn>>>,
}

/// Broadcasts transcription events to all current subscribers and keeps the
/// result cache in sync.
#[derive(Clone)]
pub struct ListenerRegistry {
    cache: ResultCache,
    set: Arc<ListenerSet>,
}

impl ListenerRegistry {
    pub fn new(cache: ResultCache) -> Self {
        Self {
            cache,
            set: Arc::new(ListenerSet {
                next_id: AtomicU64::new(0),
                listeners: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a listener. The returned guard unsubscribes when dropped.
    pub fn subscribe(
        &self,
        listener: impl Fn(&MessageId, Option<&str>) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.set.next_id.fetch_add(1, Ordering::Relaxed);
        self.set
            .listeners
            .write()
            .unwrap()
            .insert(id, Arc::new(listener));

        Subscription {
            set: Arc::downgrade(&self.set),
            id,
        }
    }

    /// Update the cache and notify every currently-subscribed listener.
    ///
    /// `Some(text)` stores the text under `key`; `None` clears the entry.
    /// Each listener subscribed before this call returns sees the event
    /// exactly once. Cross-listener delivery order is unspecified.
    pub fn publish(&self, key: &MessageId, text: Option<&str>) {
        match text {
            Some(text) => self.cache.set(key, text),
            None => self.cache.clear(key),
        }

        // Snapshot under the read lock, then invoke with the lock released so
        // a listener may freely subscribe or unsubscribe from inside its own
        // callback without deadlocking.
        let snapshot: Vec<Arc<ListenerFn>> = {
            let listeners = self.set.listeners.read().unwrap();
            listeners.values().cloned().collect()
        };

        for listener in snapshot {
            listener(key, text);
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.set.listeners.read().unwrap().len()
    }
}

/// Subscription guard returned by [`ListenerRegistry::subscribe`].
///
/// Dropping the guard removes the listener; removal is idempotent and safe
/// even while a publish is in flight on another thread.
pub struct Subscription {
    set: Weak<ListenerSet>,
    id: u64,
}

impl Subscription {
    /// Explicitly remove the listener. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(set) = self.set.upgrade() {
            set.listeners.write().unwrap().remove(&self.id);
        }
    }
}
