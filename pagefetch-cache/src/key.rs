//! Cache key derivation.

use pagefetch_config::{FetchOptions, Params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies a (fetcher, effective params) pair in the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive the key as `identity + params + explicit cache key`.
    ///
    /// Params are serialized with object keys sorted at every level, so two
    /// maps with the same content always produce the same key.
    pub fn derive(identity: &str, params: &Params, options: &FetchOptions) -> Self {
        let identity =
            serde_json::to_string(identity).unwrap_or_else(|_| identity.to_string());
        let params = canonicalize(&Value::Object(params.clone())).to_string();
        let suffix = options.cache_key.as_deref().unwrap_or_default();
        Self(format!("{identity}{params}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

// Rebuild objects in key order, independent of the map implementation
// serde_json was compiled with.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
