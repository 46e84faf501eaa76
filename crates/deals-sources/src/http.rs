//! JSON HTTP Client
//!
//! Thin reqwest wrapper shared by every marketplace client: GET a path under
//! a fixed base URL, insist on a 2xx status, decode the body into an opaque
//! `serde_json::Value` tree.

use deals_core::{ApiResponse, Result, SearchError};
use reqwest::header::HeaderMap;
use serde_json::Value;

#[derive(Clone)]
pub struct JsonHttpClient {
    http: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl JsonHttpClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach fixed headers to every request. Some sources gate their API on
    /// browser-like headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// GET `base_url + path` with `params` appended to the query string.
    ///
    /// `path` may already carry a query string (some sources hand back
    /// pre-built key-value fragments); reqwest merges `params` into it.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .headers(self.headers.clone())
            .query(params)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let payload: Value = response.json().await.map_err(transport)?;
        Ok(ApiResponse {
            payload,
            status: status.as_u16(),
        })
    }
}

fn transport(err: reqwest::Error) -> SearchError {
    SearchError::Transport(err.to_string())
}
