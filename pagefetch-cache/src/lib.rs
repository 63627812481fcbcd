//! In-memory response cache for pagefetch.
//!
//! Responses are stored as `serde_json::Value` snapshots keyed by the
//! fetcher identity and the effective request params. Entries expire lazily:
//! an expired entry is dropped the next time somebody looks it up.

mod cache;
mod key;
mod store;

pub use cache::CacheEntry;
pub use key::CacheKey;
pub use store::ResponseCache;
