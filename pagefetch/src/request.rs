//! One-shot request, the non-paginated sibling of
//! [`FetchController`](crate::FetchController).
//!
//! Fetches once per activation with the context's default params, going
//! through the response cache. Dropping the request aborts a fetch that is
//! still in flight, so a deactivated request never publishes.
use crate::cell::StateCell;
use crate::context::FetchContext;
use crate::effect::{Cleanup, OnceEffect};
use crate::fetcher::{FetchError, Fetcher};
use pagefetch_cache::{CacheKey, ResponseCache};
use pagefetch_config::{Expiry, FetchOptions, FetchOptionsPatch};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestState {
    pub response: Option<Value>,
    pub error: Option<FetchError>,
    pub is_loading: bool,
}

impl Default for RequestState {
    fn default() -> Self {
        Self {
            response: None,
            error: None,
            is_loading: true,
        }
    }
}

pub struct SingleRequest {
    fetcher: Arc<dyn Fetcher>,
    options: FetchOptions,
    cache: Arc<ResponseCache>,
    state: Arc<StateCell<RequestState>>,
    effect: OnceEffect,
}

impl SingleRequest {
    /// `expires_after` overrides the context default for this request only.
    pub fn new(
        fetcher: impl Fetcher,
        expires_after: Option<Expiry>,
        ctx: &FetchContext,
    ) -> Self {
        let patch = FetchOptionsPatch {
            expires_after,
            ..Default::default()
        };
        Self {
            fetcher: Arc::new(fetcher),
            options: ctx.provider().resolve(&patch),
            cache: Arc::clone(ctx.cache()),
            state: Arc::new(StateCell::new(RequestState::default())),
            effect: OnceEffect::new(),
        }
    }

    /// Create and activate. Must be called within a tokio runtime.
    pub fn start(
        fetcher: impl Fetcher,
        expires_after: Option<Expiry>,
        ctx: &FetchContext,
    ) -> Self {
        let request = Self::new(fetcher, expires_after, ctx);
        request.activate();
        request
    }

    /// Serve from cache or spawn the fetch. Only the first call does
    /// anything; returns whether this call did.
    pub fn activate(&self) -> bool {
        self.effect.run(|| {
            let key = self.cache_key();
            if let Some(key) = &key {
                if let Some(payload) = self.cache.get(key) {
                    debug!("Cache hit: {}", key);
                    self.state.replace(RequestState {
                        response: Some(payload),
                        error: None,
                        is_loading: false,
                    });
                    return None;
                }
            }

            let fetcher = Arc::clone(&self.fetcher);
            let cache = Arc::clone(&self.cache);
            let state = Arc::clone(&self.state);
            let options = self.options.clone();
            let handle = tokio::spawn(async move {
                let params = options.default_params.clone();
                let outcome = fetcher.fetch(params).await;
                state.replace(match outcome {
                    Ok(response) => {
                        if let Some(key) = &key {
                            cache.put(key, response.clone(), &options);
                        }
                        RequestState {
                            response: Some(response),
                            error: None,
                            is_loading: false,
                        }
                    }
                    Err(error) => {
                        warn!("Request failed: {}", error);
                        RequestState {
                            response: None,
                            error: Some(error),
                            is_loading: false,
                        }
                    }
                });
            });
            Some(Box::new(move || handle.abort()) as Cleanup)
        })
    }

    fn cache_key(&self) -> Option<CacheKey> {
        self.options.is_cacheable().then(|| {
            ResponseCache::cache_key(
                &self.fetcher.identity(),
                &self.options.default_params,
                &self.options,
            )
        })
    }

    /// Wait until the request settles and return the state.
    pub async fn settled(&self) -> RequestState {
        self.state.wait_for(|state| !state.is_loading).await
    }

    pub fn state(&self) -> RequestState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    pub fn response(&self) -> Option<Value> {
        self.state.get().response
    }

    pub fn error(&self) -> Option<FetchError> {
        self.state.get().error
    }

    pub fn is_loading(&self) -> bool {
        self.state.get().is_loading
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }
}

impl std::fmt::Debug for SingleRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleRequest")
            .field("identity", &self.fetcher.identity())
            .field("options", &self.options)
            .field("effect", &self.effect)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagefetch_config::Params;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fetches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let request = SingleRequest::new(
            move |_: Params| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, FetchError>(json!({"id": 1})) }
            },
            None,
            &FetchContext::isolated(),
        );

        assert!(request.is_loading());
        assert!(request.activate());
        assert!(!request.activate());

        let state = request.settled().await;
        assert_eq!(state.response, Some(json!({"id": 1})));
        assert_eq!(state.error, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_state() {
        let request = SingleRequest::start(
            |_: Params| async { Err::<Value, _>(FetchError::new("nope")) },
            None,
            &FetchContext::isolated(),
        );

        let state = request.settled().await;
        assert_eq!(state.response, None);
        assert_eq!(state.error.map(|err| err.message), Some("nope".to_string()));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_expiry_override() {
        let ctx = FetchContext::isolated();
        let request = SingleRequest::new(
            |_: Params| async { Ok::<_, FetchError>(Value::Null) },
            Some(Expiry::Disabled),
            &ctx,
        );
        assert_eq!(request.options().expires_after, Expiry::Disabled);
        assert_eq!(request.cache_key(), None);
    }
}
