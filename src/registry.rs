//! Single-flight job registry.
//!
//! Tracks at most one cancellation handle per key. A key present in the
//! registry means an in-flight job exists and holds exclusive rights to
//! publish updates for that key until it removes itself. Removal is
//! idempotent by design: the cancel path and the job's own exit path may
//! both attempt it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::key::MessageId;

/// Concurrent map from job key to the cancellation trigger of its active job.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    inner: Arc<Mutex<HashMap<MessageId, CancellationToken>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job for `key`.
    ///
    /// Returns a fresh cancellation token for the job to honor, or `None`
    /// when a job is already in flight for this key (single-flight).
    pub fn register(&self, key: &MessageId) -> Option<CancellationToken> {
        let mut jobs = self.inner.lock().unwrap();
        match jobs.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let token = CancellationToken::new();
                slot.insert(token.clone());
                Some(token)
            }
        }
    }

    /// Remove the handle for `key`, returning its token if one was present.
    ///
    /// Tolerates being invoked twice for the same job.
    pub fn remove(&self, key: &MessageId) -> Option<CancellationToken> {
        self.inner.lock().unwrap().remove(key)
    }

    /// Whether a job is currently in flight for `key`.
    pub fn is_active(&self, key: &MessageId) -> bool {
        self.inner.lock().unwrap().contains_key(key)
    }
}
