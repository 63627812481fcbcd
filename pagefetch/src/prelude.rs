pub use crate::{
    FetchContext, FetchController, FetchError, FetchState, Fetcher,
    NamedFetcher, RequestState, SingleRequest,
};
pub use pagefetch_config::{Expiry, FetchOptions, FetchOptionsPatch, Params};
