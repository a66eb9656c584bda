pub mod detector;
pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;

/// Conditional-fetch headers returned by a metadata-only probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeHeaders {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

#[async_trait]
pub trait Fetcher {
    /// Metadata-only request (HEAD) for the conditional-fetch headers.
    async fn probe(&self, url: &str) -> Result<ProbeHeaders>;

    /// Full read of the feed document.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
