//! HTTP fetcher backed by reqwest.
//!
//! Sends a GET to a fixed url with the effective params as query string and
//! decodes the JSON body. A non-success status fails with the decoded error
//! body attached as the error's `response`.
use crate::fetcher::{FetchError, Fetcher};
use async_trait::async_trait;
use pagefetch_config::Params;
use serde_json::Value;
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, params: Params) -> Result<Value, FetchError> {
        let query = query_pairs(&params);
        let response = self.client.get(&self.url).query(&query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(FetchError::new(format!("HTTP {status}")).with_response(body));
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn identity(&self) -> Cow<'static, str> {
        Cow::Owned(format!("GET {}", self.url))
    }
}

fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
