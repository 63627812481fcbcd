//! The injected data source.
//!
//! A fetcher takes the effective params of one call and produces a response
//! body, or fails with a [`FetchError`]. Plain async closures work out of the
//! box:
//!
//! ```ignore
//! let fetcher = |params: Params| async move {
//!     Ok::<_, FetchError>(json!({"records": [], "params": params}))
//! };
//! ```
use async_trait::async_trait;
use pagefetch_config::Params;
use serde::Serialize;
use serde_json::Value;
use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};

/// A failed fetch. `response` carries whatever payload came with the
/// failure, e.g. the decoded error body of an HTTP response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub response: Option<Value>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Build from an arbitrary rejection value. Uses its `message` and
    /// `response` fields when present.
    pub fn from_value(value: Value) -> Self {
        let message = match value.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => value.to_string(),
        };
        Self {
            message,
            response: value.get("response").cloned(),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::new(format!("JSON error: {err}"))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::new(format!("HTTP error: {err}"))
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, params: Params) -> Result<Value, FetchError>;

    /// Token identifying this fetcher in cache keys. Defaults to the
    /// concrete type, so every closure gets its own; instances of one type
    /// share it; use [`NamedFetcher`] to tell them apart.
    fn identity(&self) -> Cow<'static, str> {
        let mut hasher = DefaultHasher::new();
        TypeId::of::<Self>().hash(&mut hasher);
        Cow::Owned(format!("{}#{:x}", type_name::<Self>(), hasher.finish()))
    }
}

#[async_trait]
impl<F, Fut> Fetcher for F
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    async fn fetch(&self, params: Params) -> Result<Value, FetchError> {
        (self)(params).await
    }
}

/// A fetcher with an explicit identity.
#[derive(Debug, Clone)]
pub struct NamedFetcher<F> {
    name: String,
    inner: F,
}

impl<F: Fetcher> NamedFetcher<F> {
    pub fn new(name: impl Into<String>, inner: F) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for NamedFetcher<F> {
    async fn fetch(&self, params: Params) -> Result<Value, FetchError> {
        self.inner.fetch(params).await
    }

    fn identity(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}
