use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::app::{EstuaryError, Result};
use crate::convert::TextConverter;
use crate::domain::{ConditionalTokens, FeedOutcome, FeedRun, FetchedFeed, TrackedFeed};
use crate::fetcher::detector::{self, Detection};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::reconciler::{ItemReconciler, ReconciledFeed};

pub const DEFAULT_WORKERS: usize = 4;

/// Runs detect → fetch → parse → reconcile for many feeds at once, bounded
/// by a semaphore. Nothing is written here; results are collected for a
/// single store commit.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    converter: Arc<dyn TextConverter>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, converter: Arc<dyn TextConverter>) -> Self {
        Self::with_workers(fetcher, converter, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        converter: Arc<dyn TextConverter>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            converter,
            normalizer: Normalizer::new(),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Returns one [`FeedRun`] per input feed, in input order.
    pub async fn fetch_all(&self, feeds: Vec<TrackedFeed>) -> Vec<FeedRun> {
        let mut handles = Vec::new();

        for feed in &feeds {
            let fetcher = self.fetcher.clone();
            let converter = self.converter.clone();
            let normalizer = self.normalizer.clone();
            let semaphore = self.semaphore.clone();
            let feed = feed.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => return FeedOutcome::Failed(EstuaryError::network(feed.url(), e)),
                };

                let result =
                    sync_single_feed(fetcher.as_ref(), &normalizer, converter.as_ref(), &feed)
                        .await;
                into_outcome(result)
            });

            handles.push(handle);
        }

        let joined = futures::future::join_all(handles).await;

        feeds
            .into_iter()
            .zip(joined)
            .map(|(feed, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    tracing::error!("Task join error for {}: {}", feed.url(), e);
                    FeedOutcome::Failed(EstuaryError::network(feed.url(), e))
                });
                FeedRun::new(feed, outcome)
            })
            .collect()
    }
}

async fn sync_single_feed(
    fetcher: &(dyn Fetcher + Send + Sync),
    normalizer: &Normalizer,
    converter: &dyn TextConverter,
    feed: &TrackedFeed,
) -> Result<(ConditionalTokens, ReconciledFeed)> {
    let tokens = match detector::detect(fetcher, feed.url(), &feed.state.tokens).await? {
        Detection::Unchanged { matched } => return Err(EstuaryError::Unchanged(matched)),
        Detection::Proceed(tokens) => tokens,
    };

    let body = fetcher.fetch(feed.url()).await?;
    let parsed = normalizer.parse(&body)?;
    let reconciled =
        ItemReconciler::new(&feed.subscription, converter).reconcile(parsed, feed.state.watermark)?;

    tracing::debug!(
        "{}: {} candidate entries, {} skipped",
        feed.url(),
        reconciled.entries.len(),
        reconciled.skipped.len()
    );

    Ok((tokens, reconciled))
}

fn into_outcome(result: Result<(ConditionalTokens, ReconciledFeed)>) -> FeedOutcome {
    match result {
        Ok((tokens, reconciled)) => FeedOutcome::Fetched(FetchedFeed {
            meta: reconciled.meta,
            tokens,
            entries: reconciled.entries,
        }),
        Err(EstuaryError::Unchanged(matched)) => FeedOutcome::Unchanged { matched },
        Err(e) => FeedOutcome::Failed(e),
    }
}
