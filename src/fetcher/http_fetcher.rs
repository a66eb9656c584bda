use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ETAG, LAST_MODIFIED};
use reqwest::Client;

use crate::app::{EstuaryError, Result};
use crate::fetcher::{Fetcher, ProbeHeaders};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("estuary/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| EstuaryError::network("client setup", e))?;

        Ok(Self { client })
    }
}

fn header_value(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn probe(&self, url: &str) -> Result<ProbeHeaders> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| EstuaryError::network(url, e))?;

        let headers = response.headers();
        Ok(ProbeHeaders {
            etag: header_value(headers, ETAG),
            last_modified: header_value(headers, LAST_MODIFIED),
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EstuaryError::network(url, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| EstuaryError::network(url, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| EstuaryError::network(url, e))?;

        Ok(body.to_vec())
    }
}
