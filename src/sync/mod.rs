//! One synchronization run: join subscriptions with the stored snapshot,
//! fetch and reconcile every feed, then commit everything at once.

use std::collections::HashMap;

use url::Url;

use crate::app::Result;
use crate::config::SubscriptionList;
use crate::domain::{FeedOutcome, FeedRun, StoredFeed, TrackedFeed};
use crate::fetcher::parallel::ParallelFetcher;
use crate::store::{CommitReport, Store};

pub const VIDEO_TAG: &str = "video";
pub const DEFAULT_TAG: &str = "uncategorized";

/// Per-feed line of a run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSummary {
    pub url: String,
    pub status: &'static str,
    /// Candidate entries handed to the commit.
    pub entries: usize,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub feeds: Vec<FeedSummary>,
    pub commit: CommitReport,
}

impl SyncReport {
    pub fn count(&self, status: &str) -> usize {
        self.feeds.iter().filter(|f| f.status == status).count()
    }
}

pub struct SyncOrchestrator<'a, S: Store> {
    store: &'a S,
    fetcher: &'a ParallelFetcher,
}

impl<'a, S: Store> SyncOrchestrator<'a, S> {
    pub fn new(store: &'a S, fetcher: &'a ParallelFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Store failures and non-recoverable feed errors abort the run before
    /// anything is committed; recoverable per-feed failures only show up in
    /// the report.
    pub async fn run(&self, subscriptions: &SubscriptionList) -> Result<SyncReport> {
        let stored = self.store.load()?;
        tracing::info!(
            "Reconciling {} subscriptions against {} stored feeds",
            subscriptions.feeds.len(),
            stored.len()
        );

        let feeds = track(subscriptions, stored);
        let mut runs = self.fetcher.fetch_all(feeds).await;

        if let Some(pos) = runs.iter().position(is_fatal) {
            if let FeedOutcome::Failed(e) = runs.swap_remove(pos).outcome {
                tracing::error!("Aborting run: {}", e);
                return Err(e);
            }
        }

        let feeds: Vec<FeedSummary> = runs.iter().map(summarize).collect();
        for summary in &feeds {
            match &summary.message {
                Some(message) if summary.status == "ERROR" => {
                    tracing::warn!(url = %summary.url, "Feed failed: {}", message)
                }
                _ => tracing::debug!(url = %summary.url, status = summary.status, "Feed done"),
            }
        }

        let commit = self.store.commit(&runs)?;

        Ok(SyncReport { feeds, commit })
    }
}

/// Left-joins subscriptions with stored feeds by address, carrying identity
/// and sync state forward, and derives each feed's tag set.
pub fn track(subscriptions: &SubscriptionList, stored: Vec<StoredFeed>) -> Vec<TrackedFeed> {
    let mut by_url: HashMap<String, StoredFeed> =
        stored.into_iter().map(|f| (f.url.clone(), f)).collect();

    subscriptions
        .feeds
        .iter()
        .map(|subscription| {
            let mut feed = TrackedFeed::new(subscription.clone());
            if let Some(known) = by_url.remove(&subscription.url) {
                feed.id = Some(known.id);
                feed.state = known.state;
            }
            feed.tags = derive_tags(&subscription.url, &subscription.tags);
            feed
        })
        .collect()
}

pub fn derive_tags(url: &str, configured: &[String]) -> Vec<String> {
    let mut tags = configured.to_vec();
    if is_video_source(url) && !tags.iter().any(|t| t == VIDEO_TAG) {
        tags.push(VIDEO_TAG.to_string());
    }
    if tags.is_empty() {
        tags.push(DEFAULT_TAG.to_string());
    }
    tags
}

fn is_video_source(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.contains("youtube.com")))
        .unwrap_or(false)
}

fn is_fatal(run: &FeedRun) -> bool {
    matches!(&run.outcome, FeedOutcome::Failed(e) if !e.is_recoverable())
}

fn summarize(run: &FeedRun) -> FeedSummary {
    let (entries, message) = match &run.outcome {
        FeedOutcome::Fetched(fetched) => (fetched.entries.len(), None),
        FeedOutcome::Unchanged { matched } => (0, Some(format!("{} matched", matched))),
        FeedOutcome::Failed(e) => (0, Some(e.to_string())),
    };

    FeedSummary {
        url: run.feed.url().to_string(),
        status: run.status(),
        entries,
        message,
    }
}
