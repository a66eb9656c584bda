pub mod entry;
pub mod feed;
pub mod run;

pub use entry::{Entry, RawItem, StoredEntry};
pub use feed::{
    ConditionalTokens, ExcludeRange, FeedMeta, StoredFeed, Subscription, SyncState, TrackedFeed,
};
pub use run::{FeedOutcome, FeedRun, FetchedFeed};
