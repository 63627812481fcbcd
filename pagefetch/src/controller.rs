//! Paginated fetch controller.
//!
//! Owns the loading/error/records state of one data source and drives it
//! through repeated fetches: `load`, `reload`, `go_to_page`, `load_more` and
//! `reset` all re-enter the loading phase, consult the response cache and
//! only call the fetcher on a miss.
//!
//! Each load takes a generation number when it starts. When it settles its
//! result is committed only if no newer load was started in the meantime, so
//! a slow response can never overwrite a fresher one. The caller awaiting a
//! superseded load still receives its result.
use crate::cell::StateCell;
use crate::context::FetchContext;
use crate::effect::OnceEffect;
use crate::fetcher::{FetchError, Fetcher};
use crate::state::FetchState;
use pagefetch_cache::{CacheKey, ResponseCache};
use pagefetch_config::{FetchOptions, FetchOptionsPatch, Params};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, instrument, warn};

/// Cloneable handle, clones drive the same state.
#[derive(Clone)]
pub struct FetchController {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn Fetcher>,
    identity: String,
    options: FetchOptions,
    cache: Arc<ResponseCache>,
    state: StateCell<FetchState>,
    generation: AtomicU64,
    activation: OnceEffect,
}

impl FetchController {
    /// Create a controller in the loading state without fetching anything.
    /// `options` are applied on top of the context's defaults.
    pub fn new(
        fetcher: impl Fetcher,
        options: &FetchOptionsPatch,
        ctx: &FetchContext,
    ) -> Self {
        let options = ctx.provider().resolve(options);
        let identity = fetcher.identity().into_owned();
        let state = StateCell::new(FetchState::new(options.default_params.clone()));

        Self {
            inner: Arc::new(Inner {
                fetcher: Arc::new(fetcher),
                identity,
                options,
                cache: Arc::clone(ctx.cache()),
                state,
                generation: AtomicU64::new(0),
                activation: OnceEffect::new(),
            }),
        }
    }

    /// Create and activate. Must be called within a tokio runtime.
    pub fn start(
        fetcher: impl Fetcher,
        options: &FetchOptionsPatch,
        ctx: &FetchContext,
    ) -> Self {
        let controller = Self::new(fetcher, options, ctx);
        controller.activate();
        controller
    }

    /// Spawn the initial load with the default params. Only the first call
    /// per controller does anything; returns whether this call did.
    pub fn activate(&self) -> bool {
        self.inner.activation.run(|| {
            debug!("Activating fetch controller for {}", self.inner.identity);
            // the initial load is observed through state, not awaited
            drop(self.spawn_load(Params::new()));
            None
        })
    }

    /// Run [`load`](Self::load) in the background.
    pub fn spawn_load(&self, params: Params) -> JoinHandle<Result<Value, FetchError>> {
        let controller = self.clone();
        tokio::spawn(async move { controller.load(params).await })
    }

    /// Fetch with `params` merged over the default params.
    ///
    /// A valid cached response for the effective params is applied without
    /// calling the fetcher. Resolves with the response body, or with the
    /// fetch error which is also recorded in state.
    ///
    /// The fetch runs on its own task: dropping the returned future stops
    /// waiting for it but the load still settles and commits to state.
    #[instrument(skip(self, params), fields(fetcher = %self.inner.identity))]
    pub async fn load(&self, params: Params) -> Result<Value, FetchError> {
        let params = self.inner.options.effective_params(&params);
        let generation = self.inner.begin_loading();
        let inner = Arc::clone(&self.inner);

        let task = async move { inner.settle(generation, params).await };
        tokio::spawn(task.in_current_span())
            .await
            .unwrap_or_else(|err| {
                let error = FetchError::new(format!("Load task failed: {err}"));
                self.inner.commit_error(generation, error.clone());
                Err(error)
            })
    }

    /// Repeat the last load with the same params.
    pub async fn reload(&self) -> Result<Value, FetchError> {
        let params = self.inner.state.get().params;
        self.load(params).await
    }

    /// Load `page` keeping the rest of the current params. A page number
    /// already present in the current params is overridden by `page`.
    /// No bounds checking: the server decides what an out-of-range page
    /// returns.
    pub async fn go_to_page(&self, page: u64) -> Result<Value, FetchError> {
        let mut params = self.inner.state.get().params;
        params.insert(self.inner.options.keys.page_number.clone(), Value::from(page));
        self.load(params).await
    }

    pub async fn load_more(&self) -> Result<Value, FetchError> {
        let next = self.inner.state.get().current_page + 1;
        self.go_to_page(next).await
    }

    /// Load with the default params only, dropping explicit ones.
    pub async fn reset(&self) -> Result<Value, FetchError> {
        self.load(self.inner.options.default_params.clone()).await
    }

    /// Wait until the current load settles and return the state.
    pub async fn settled(&self) -> FetchState {
        self.inner.state.wait_for(|state| !state.is_loading).await
    }

    pub fn state(&self) -> FetchState {
        self.inner.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.inner.state.subscribe()
    }

    pub fn options(&self) -> &FetchOptions {
        &self.inner.options
    }

    pub fn default_params(&self) -> &Params {
        &self.inner.options.default_params
    }

    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    /// Cache key a load with `params` would use.
    pub fn cache_key(&self, params: &Params) -> CacheKey {
        let params = self.inner.options.effective_params(params);
        ResponseCache::cache_key(&self.inner.identity, &params, &self.inner.options)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.get().is_loading
    }

    pub fn records(&self) -> Vec<Value> {
        self.inner.state.get().records
    }

    pub fn error(&self) -> Option<FetchError> {
        self.inner.state.get().error
    }

    pub fn current_page(&self) -> u64 {
        self.inner.state.get().current_page
    }

    pub fn is_first_page(&self) -> bool {
        self.inner.state.get().is_first_page()
    }

    pub fn is_last_page(&self) -> bool {
        self.inner.state.get().is_last_page()
    }

    pub fn paginatable(&self) -> bool {
        self.inner.state.get().paginatable()
    }
}

impl std::fmt::Debug for FetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController")
            .field("identity", &self.inner.identity)
            .field("options", &self.inner.options)
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl Inner {
    /// Mark state as loading and take the next generation number.
    fn begin_loading(&self) -> u64 {
        let mut generation = 0;
        self.state.update(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.is_loading = true;
        });
        generation
    }

    /// Serve `params` from the cache or the fetcher and commit the outcome
    /// under `generation`.
    async fn settle(
        &self,
        generation: u64,
        params: Params,
    ) -> Result<Value, FetchError> {
        let cache_key = self.options.is_cacheable().then(|| {
            ResponseCache::cache_key(&self.identity, &params, &self.options)
        });

        if let Some(key) = &cache_key {
            if let Some(payload) = self.cache.get(key) {
                debug!("Cache hit: {}", key);
                self.commit_response(generation, payload.clone(), params);
                return Ok(payload);
            }
            debug!("Cache miss: {}", key);
        }

        match self.fetcher.fetch(params.clone()).await {
            Ok(response) => {
                if let Some(key) = &cache_key {
                    self.cache.put(key, response.clone(), &self.options);
                }
                self.commit_response(generation, response.clone(), params);
                Ok(response)
            }
            Err(error) => {
                warn!("Fetch failed: {}", error);
                self.commit_error(generation, error.clone());
                Err(error)
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn commit_response(&self, generation: u64, response: Value, params: Params) {
        let committed = self.state.update_if(|state| {
            if !self.is_current(generation) {
                return false;
            }
            state.apply_response(response, params, &self.options.keys);
            true
        });
        if committed {
            info!("Loaded page {}", self.state.get().current_page);
        } else {
            debug!("Discarding superseded response (generation {})", generation);
        }
    }

    fn commit_error(&self, generation: u64, error: FetchError) {
        let committed = self.state.update_if(|state| {
            if !self.is_current(generation) {
                return false;
            }
            state.apply_error(error);
            true
        });
        if !committed {
            debug!("Discarding superseded error (generation {})", generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagefetch_config::Expiry;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn page_response(page: u64) -> Value {
        json!({
            "records": [page * 10, page * 10 + 1],
            "paginationInfo": {
                "currentPage": page,
                "totalPages": 3,
                "totalRecords": 6,
                "currentRecords": 2,
            }
        })
    }

    /// Fetcher serving three pages and recording the params it was called with.
    fn recording_fetcher(
        calls: Arc<Mutex<Vec<Params>>>,
    ) -> impl Fetcher {
        move |params: Params| {
            calls.lock().unwrap().push(params.clone());
            let page = params.get("page").and_then(Value::as_u64).unwrap_or(1);
            async move { Ok::<_, FetchError>(page_response(page)) }
        }
    }

    fn no_cache() -> FetchOptionsPatch {
        FetchOptionsPatch::builder()
            .expires_after(Expiry::Disabled)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_is_loading_without_fetching() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let controller = FetchController::new(
            recording_fetcher(calls.clone()),
            &no_cache(),
            &FetchContext::isolated(),
        );

        assert!(controller.is_loading());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_only_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let controller = FetchController::new(
            recording_fetcher(calls.clone()),
            &no_cache(),
            &FetchContext::isolated(),
        );

        assert!(controller.activate());
        assert!(!controller.activate());
        let state = controller.settled().await;

        assert_eq!(state.current_page, 1);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_go_to_page_keeps_params() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let controller = FetchController::new(
            recording_fetcher(calls.clone()),
            &no_cache(),
            &FetchContext::isolated(),
        );

        let mut params = Params::new();
        params.insert("q".into(), json!("rust"));
        controller.load(params).await.unwrap();
        controller.go_to_page(2).await.unwrap();

        let last = calls.lock().unwrap().last().cloned().unwrap();
        assert_eq!(Value::Object(last), json!({"q": "rust", "page": 2}));
        assert_eq!(controller.current_page(), 2);
        assert_eq!(controller.records(), vec![json!(20), json!(21)]);
    }

    #[tokio::test]
    async fn test_stale_generation_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(
            {
                let calls = calls.clone();
                move |_: Params| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, FetchError>(page_response(1)) }
                }
            },
            &no_cache(),
            &FetchContext::isolated(),
        );

        let first = controller.inner.begin_loading();
        let second = controller.inner.begin_loading();
        controller
            .inner
            .commit_response(second, page_response(2), Params::new());
        controller
            .inner
            .commit_response(first, page_response(3), Params::new());

        assert_eq!(controller.current_page(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
