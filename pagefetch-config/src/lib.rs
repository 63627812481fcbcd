pub mod config;
pub mod options;
pub mod provider;

pub use config::{ConfigError, load_options};
pub use options::{
    Expiry, FetchOptions, FetchOptionsPatch, FetchOptionsPatchBuilder,
    FetchOptionsPatchBuilderError, KeyPaths, KeyPathsPatch,
    KeyPathsPatchBuilder, KeyPathsPatchBuilderError, Params,
};
pub use provider::FetchOptionsProvider;
