//! Provider of default fetch options.
//!
//! Built once at application start and shared by reference with every
//! controller, instead of living in ambient global state. Controllers read a
//! snapshot when they are activated, later `set` calls affect only
//! controllers activated afterwards.
use crate::config::{ConfigError, load_options};
use crate::options::{FetchOptions, FetchOptionsPatch};
use std::path;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct FetchOptionsProvider {
    current: RwLock<FetchOptions>,
}

impl FetchOptionsProvider {
    /// Provider seeded with the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FetchOptions) -> Self {
        Self {
            current: RwLock::new(options),
        }
    }

    /// Built-in defaults overlaid with the options from a yaml file.
    pub fn from_yaml(
        config_file_path: impl AsRef<path::Path>,
    ) -> Result<Self, ConfigError> {
        let patch = load_options(config_file_path)?;
        Ok(Self::with_options(FetchOptions::default().merged(&patch)))
    }

    /// Merge `patch` into the current defaults.
    pub fn set(&self, patch: &FetchOptionsPatch) {
        let mut current =
            self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.merge(patch);
    }

    /// Snapshot of the current defaults.
    pub fn get(&self) -> FetchOptions {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current defaults with call-site options applied on top.
    pub fn resolve(&self, patch: &FetchOptionsPatch) -> FetchOptions {
        self.get().merged(patch)
    }
}
