//! Conditional-fetch change detection.
//!
//! A HEAD probe is compared against the tokens stored for the feed. A
//! matching entity-tag or last-modified value means the source has not
//! changed since the last successful fetch. Fresh tokens are only returned
//! to the caller; persisting them is left to the store commit so a token is
//! never recorded for content that was not actually retrieved.

use crate::app::Result;
use crate::domain::ConditionalTokens;
use crate::fetcher::{Fetcher, ProbeHeaders};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A probed token matched the stored one.
    Unchanged { matched: String },
    /// Worth fetching; carries the tokens to persist after a good fetch.
    Proceed(ConditionalTokens),
}

pub async fn detect<F>(fetcher: &F, url: &str, stored: &ConditionalTokens) -> Result<Detection>
where
    F: Fetcher + Send + Sync + ?Sized,
{
    let headers = fetcher.probe(url).await?;
    Ok(compare(url, stored, headers))
}

pub fn compare(url: &str, stored: &ConditionalTokens, probed: ProbeHeaders) -> Detection {
    let mut tokens = stored.clone();

    if let Some(etag) = probed.etag.filter(|v| !v.is_empty()) {
        tracing::debug!("etag {} for {} (stored {:?})", etag, url, stored.etag);
        if stored.etag.as_deref() == Some(etag.as_str()) {
            return Detection::Unchanged {
                matched: format!("etag {etag}"),
            };
        }
        tokens.etag = Some(etag);
    }

    if let Some(last_modified) = probed.last_modified.filter(|v| !v.is_empty()) {
        tracing::debug!(
            "last-modified {} for {} (stored {:?})",
            last_modified,
            url,
            stored.last_modified
        );
        if stored.last_modified.as_deref() == Some(last_modified.as_str()) {
            return Detection::Unchanged {
                matched: format!("last-modified {last_modified}"),
            };
        }
        tokens.last_modified = Some(last_modified);
    }

    Detection::Proceed(tokens)
}
