use chrono::{DateTime, Utc};
use pagefetch_config::Expiry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached response snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload, an owned copy of what the fetcher returned
    pub payload: Value,
    /// When this entry was stored
    pub created_at: DateTime<Utc>,
    /// When this entry stops being valid, `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(payload: Value, expiry: Expiry, now: DateTime<Utc>) -> Self {
        let expires_at = match expiry {
            Expiry::Disabled => Some(now),
            Expiry::After(ttl) => chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl)),
            Expiry::Forever => None,
        };
        Self {
            payload,
            created_at: now,
            expires_at,
        }
    }

    /// Valid iff `expires_at > now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry as unix milliseconds.
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| expires_at.timestamp_millis())
    }
}
