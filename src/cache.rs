//! Session-scoped result cache.
//!
//! The cache is the single source of truth for "do we already have a
//! transcription for this key". Presence of an entry means the key has a
//! displayable transcription; absence means none yet, or the user dismissed
//! it. Only finalized text goes in here — partials are persisted transiently
//! at most, via the publish path, and are always superseded.
//!
//! There is no eviction policy beyond explicit `clear`: the cache is
//! in-memory and scoped to one session, so unbounded growth is acceptable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::key::MessageId;

/// Concurrent map from job key to latest known transcript text.
///
/// Cloning hands out another handle to the same underlying map. Reads may
/// come from many observers at once; writes come from the single job that
/// owns the key (or from the cancel path), so same-key writes never race.
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    inner: Arc<RwLock<HashMap<MessageId, String>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known transcript text for `key`, if any.
    pub fn get(&self, key: &MessageId) -> Option<String> {
        self.inner.read().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &MessageId) -> bool {
        self.inner.read().unwrap().contains_key(key)
    }

    /// Store the latest text for `key`, replacing any previous value.
    pub fn set(&self, key: &MessageId, text: impl Into<String>) {
        self.inner.write().unwrap().insert(key.clone(), text.into());
    }

    /// Remove the entry for `key`. Idempotent.
    pub fn clear(&self, key: &MessageId) {
        self.inner.write().unwrap().remove(key);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}
