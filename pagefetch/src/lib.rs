//! # pagefetch
//!
//! Fetch orchestration for async data-producing functions: loading state,
//! pagination and a shared, time-expiring response cache.
//!
//! ## Features
//!
//! - **Paginated controller**: `FetchController` keeps records and pagination
//!   fields extracted from arbitrary response shapes through configurable
//!   dot-notation key paths, and exposes `load`, `reload`, `go_to_page`,
//!   `load_more` and `reset`.
//! - **One-shot requests**: `SingleRequest` fetches once per activation.
//! - **Response cache**: responses are cached per fetcher and effective
//!   params, with per-call expiry; `0` disables caching.
//! - **Layered options**: built-in defaults, provider-wide defaults and
//!   call-site options, merged field by field.
//! - **HTTP fetcher** (feature `http`): a reqwest-backed fetcher.
//!
//! ## Modules
//!
//! - `path`: dot-notation lookups into `serde_json::Value`.
//! - `fetcher`: the `Fetcher` trait and `FetchError`.
//! - `controller`: paginated fetch controller.
//! - `request`: one-shot request.
//! - `cell`, `effect`: state slot and run-once activation hook.
//! - `logging`: tracing subscriber setup.
pub mod cell;
pub mod context;
pub mod controller;
pub mod effect;
pub mod fetcher;
#[cfg(feature = "http")]
pub mod http;
pub mod logging;
pub mod path;
pub mod prelude;
pub mod request;
pub mod state;

pub use pagefetch_cache as cache;
pub use pagefetch_config as config;

pub use context::FetchContext;
pub use controller::FetchController;
pub use fetcher::{FetchError, Fetcher, NamedFetcher};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use request::{RequestState, SingleRequest};
pub use state::FetchState;

// re-export
pub use async_trait;
#[cfg(feature = "http")]
pub use reqwest;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;
