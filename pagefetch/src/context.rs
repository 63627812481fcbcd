//! Shared collaborators of every controller: option defaults and the
//! response cache.
use pagefetch_cache::ResponseCache;
use pagefetch_config::{FetchOptions, FetchOptionsPatch, FetchOptionsProvider};
use std::sync::Arc;

/// Cheap to clone; clones share the same provider and cache.
#[derive(Debug, Clone)]
pub struct FetchContext {
    options: Arc<FetchOptionsProvider>,
    cache: Arc<ResponseCache>,
}

impl Default for FetchContext {
    /// Built-in option defaults and the process-wide response cache.
    fn default() -> Self {
        Self::new(Arc::new(FetchOptionsProvider::new()), ResponseCache::global())
    }
}

impl FetchContext {
    pub fn new(
        options: Arc<FetchOptionsProvider>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self { options, cache }
    }

    /// Context with its own provider and its own empty cache.
    pub fn isolated() -> Self {
        Self::new(
            Arc::new(FetchOptionsProvider::new()),
            Arc::new(ResponseCache::new()),
        )
    }

    pub fn provider(&self) -> &Arc<FetchOptionsProvider> {
        &self.options
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Merge `patch` into the defaults for controllers activated from now on.
    pub fn set_fetch_options(&self, patch: &FetchOptionsPatch) {
        self.options.set(patch);
    }

    pub fn fetch_options(&self) -> FetchOptions {
        self.options.get()
    }
}
