use crate::app::EstuaryError;
use crate::domain::{ConditionalTokens, Entry, FeedMeta, TrackedFeed};

/// Everything a successful cycle produced for one feed.
#[derive(Debug, Clone, Default)]
pub struct FetchedFeed {
    pub meta: FeedMeta,
    pub tokens: ConditionalTokens,
    pub entries: Vec<Entry>,
}

#[derive(Debug)]
pub enum FeedOutcome {
    Fetched(FetchedFeed),
    /// Conditional tokens matched; nothing was fetched.
    Unchanged { matched: String },
    /// Network, parse or conversion failure; the cycle was abandoned.
    Failed(EstuaryError),
}

/// One feed's result for the current run, handed to the store commit.
#[derive(Debug)]
pub struct FeedRun {
    pub feed: TrackedFeed,
    pub outcome: FeedOutcome,
}

impl FeedRun {
    pub fn new(feed: TrackedFeed, outcome: FeedOutcome) -> Self {
        Self { feed, outcome }
    }

    /// The configured title wins; otherwise whatever the source published.
    pub fn incoming_title(&self) -> Option<&str> {
        self.feed.subscription.configured_title().or_else(|| match &self.outcome {
            FeedOutcome::Fetched(fetched) => fetched
                .meta
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty()),
            _ => None,
        })
    }

    pub fn fetched(&self) -> Option<&FetchedFeed> {
        match &self.outcome {
            FeedOutcome::Fetched(fetched) => Some(fetched),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self.outcome {
            FeedOutcome::Fetched(_) => "OK",
            FeedOutcome::Unchanged { .. } => "UNCHANGED",
            FeedOutcome::Failed(_) => "ERROR",
        }
    }
}
