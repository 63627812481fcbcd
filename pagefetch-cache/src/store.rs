//! Process-wide response store.
//!
//! Every controller that shares a `ResponseCache` reads and writes the same
//! entries. Writes to one key are last-write-wins; entries are immutable
//! snapshots so nothing ever has to be merged.
use crate::{CacheEntry, CacheKey};
use chrono::Utc;
use once_cell::sync::Lazy;
use pagefetch_config::{FetchOptions, Params};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

static GLOBAL: Lazy<Arc<ResponseCache>> =
    Lazy::new(|| Arc::new(ResponseCache::new()));

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process. Lives until the process exits.
    pub fn global() -> Arc<ResponseCache> {
        Arc::clone(&GLOBAL)
    }

    pub fn cache_key(
        identity: &str,
        params: &Params,
        options: &FetchOptions,
    ) -> CacheKey {
        CacheKey::derive(identity, params, options)
    }

    pub fn is_cacheable(options: &FetchOptions) -> bool {
        options.is_cacheable()
    }

    /// Cached payload for `key`, if present and not expired.
    /// An expired entry is removed on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.is_expired_at(Utc::now()) {
            debug!("Cache entry expired: {}", key);
            entries.remove(key);
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Store `payload` under `key`, replacing whatever was there.
    /// Does nothing when `options` disable caching.
    pub fn put(&self, key: &CacheKey, payload: Value, options: &FetchOptions) {
        if !options.is_cacheable() {
            debug!("Caching disabled, not storing: {}", key);
            return;
        }
        let entry = CacheEntry::new(payload, options.expires_after, Utc::now());
        self.lock().insert(key.clone(), entry);
    }

    pub fn delete(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().remove(key)
    }

    /// Copy of every stored entry, expired ones included.
    pub fn all(&self) -> HashMap<CacheKey, CacheEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Entries are plain values, a panic elsewhere cannot leave them
    // half-written, so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
