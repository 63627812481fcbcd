//! Fetch options and the rules for layering them.
//!
//! Options are resolved in three layers, last write wins:
//! built-in defaults, then provider-wide defaults, then call-site options.
//! Every layer above the built-in one is a patch where each field is
//! optional. `keys` merges path by path, never as a whole.
use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::time::Duration;

/// Parameters passed to a fetcher. Ordered by key, so serializing the same
/// content always yields the same string.
pub type Params = Map<String, Value>;

/// Default lifetime of a cached response (five minutes).
pub const DEFAULT_EXPIRES_AFTER: Duration = Duration::from_millis(60 * 5000);

/// How long a fetched response stays in the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Do not cache at all (`expires_after: 0`).
    Disabled,
    /// Cache for the given duration.
    After(Duration),
    /// Cache for the rest of the process lifetime.
    Forever,
}

impl Default for Expiry {
    fn default() -> Self {
        Expiry::After(DEFAULT_EXPIRES_AFTER)
    }
}

impl Expiry {
    /// Build from milliseconds, `0` disables caching.
    pub fn from_millis(millis: u64) -> Self {
        if millis == 0 {
            Expiry::Disabled
        } else {
            Expiry::After(Duration::from_millis(millis))
        }
    }

    pub fn is_cacheable(&self) -> bool {
        match self {
            Expiry::Disabled => false,
            Expiry::After(ttl) => !ttl.is_zero(),
            Expiry::Forever => true,
        }
    }

    /// Time-to-live, `None` for both `Disabled` and `Forever`.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Expiry::After(ttl) => Some(*ttl),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpiry {
    Millis(u64),
    Keyword(String),
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawExpiry::deserialize(deserializer)? {
            RawExpiry::Millis(millis) => Ok(Expiry::from_millis(millis)),
            RawExpiry::Keyword(word) if word.eq_ignore_ascii_case("forever") => {
                Ok(Expiry::Forever)
            }
            RawExpiry::Keyword(word) => Err(serde::de::Error::custom(format!(
                "unknown expiry `{word}`, expected milliseconds or \"forever\""
            ))),
        }
    }
}

impl Serialize for Expiry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Expiry::Disabled => serializer.serialize_u64(0),
            Expiry::After(ttl) => {
                serializer.serialize_u64(ttl.as_millis() as u64)
            }
            Expiry::Forever => serializer.serialize_str("forever"),
        }
    }
}

/// Dot-notation paths into a response body for each logical field.
/// `page_number` is the outgoing request parameter name, not a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPaths {
    pub records: String,
    pub items_per_page: String,
    pub current_page: String,
    pub total_pages: String,
    pub total_records: String,
    pub current_records: String,
    pub page_number: String,
}

impl Default for KeyPaths {
    fn default() -> Self {
        Self {
            records: "records".to_string(),
            items_per_page: "paginationInfo.itemsPerPage".to_string(),
            current_page: "paginationInfo.currentPage".to_string(),
            total_pages: "paginationInfo.totalPages".to_string(),
            total_records: "paginationInfo.totalRecords".to_string(),
            current_records: "paginationInfo.currentRecords".to_string(),
            page_number: "page".to_string(),
        }
    }
}

impl KeyPaths {
    pub fn merge(&mut self, patch: &KeyPathsPatch) {
        let slots = [
            (&mut self.records, &patch.records),
            (&mut self.items_per_page, &patch.items_per_page),
            (&mut self.current_page, &patch.current_page),
            (&mut self.total_pages, &patch.total_pages),
            (&mut self.total_records, &patch.total_records),
            (&mut self.current_records, &patch.current_records),
            (&mut self.page_number, &patch.page_number),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
    }
}

#[derive(Builder, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[builder(public, default, setter(into, strip_option))]
#[serde(default)]
pub struct KeyPathsPatch {
    pub records: Option<String>,
    pub items_per_page: Option<String>,
    pub current_page: Option<String>,
    pub total_pages: Option<String>,
    pub total_records: Option<String>,
    pub current_records: Option<String>,
    pub page_number: Option<String>,
}

impl KeyPathsPatch {
    pub fn builder() -> KeyPathsPatchBuilder {
        KeyPathsPatchBuilder::default()
    }
}

/// Partial options, used both for provider-wide defaults and per call.
#[derive(Builder, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[builder(public, default, setter(into, strip_option))]
#[serde(default)]
pub struct FetchOptionsPatch {
    pub default_params: Option<Params>,
    pub items_per_page: Option<u64>,
    pub cache_key: Option<String>,
    pub expires_after: Option<Expiry>,
    pub keys: Option<KeyPathsPatch>,
}

impl FetchOptionsPatch {
    pub fn builder() -> FetchOptionsPatchBuilder {
        FetchOptionsPatchBuilder::default()
    }
}

/// Fully resolved options a controller runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Merged under explicit call params on every fetch.
    pub default_params: Params,
    /// Informational only.
    pub items_per_page: Option<u64>,
    /// Appended to the derived cache key.
    pub cache_key: Option<String>,
    pub expires_after: Expiry,
    pub keys: KeyPaths,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            default_params: Params::new(),
            items_per_page: None,
            cache_key: None,
            expires_after: Expiry::default(),
            keys: KeyPaths::default(),
        }
    }
}

impl FetchOptions {
    /// Apply `patch` on top of these options in place.
    pub fn merge(&mut self, patch: &FetchOptionsPatch) {
        if let Some(params) = &patch.default_params {
            self.default_params.clone_from(params);
        }
        if let Some(items_per_page) = patch.items_per_page {
            self.items_per_page = Some(items_per_page);
        }
        if let Some(cache_key) = &patch.cache_key {
            self.cache_key = Some(cache_key.clone());
        }
        if let Some(expires_after) = patch.expires_after {
            self.expires_after = expires_after;
        }
        if let Some(keys) = &patch.keys {
            self.keys.merge(keys);
        }
    }

    pub fn merged(&self, patch: &FetchOptionsPatch) -> Self {
        let mut options = self.clone();
        options.merge(patch);
        options
    }

    pub fn is_cacheable(&self) -> bool {
        self.expires_after.is_cacheable()
    }

    /// Default params overlaid with `params`.
    pub fn effective_params(&self, params: &Params) -> Params {
        let mut effective = self.default_params.clone();
        for (key, value) in params {
            effective.insert(key.clone(), value.clone());
        }
        effective
    }
}
