pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{FeedMeta, FeedRun, StoredEntry, StoredFeed, SyncState};

pub use sqlite::SqliteStore;

/// Counters for one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub feeds_created: usize,
    pub entries_inserted: usize,
    /// Entries whose address was already stored.
    pub entries_conflicted: usize,
    /// Entries at or below the stored watermark at commit time.
    pub entries_stale: usize,
    pub tags: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub entry_id: i64,
    pub feed_id: i64,
    pub published: DateTime<Utc>,
    pub title: String,
    pub url: String,
}

pub trait Store {
    // Sync operations
    fn load(&self) -> Result<Vec<StoredFeed>>;
    fn commit(&self, runs: &[FeedRun]) -> Result<CommitReport>;

    // Read side
    fn sync_state(&self, feed_id: i64) -> Result<Option<SyncState>>;
    fn feed_details(&self, feed_id: i64) -> Result<Option<FeedMeta>>;
    fn entries_for_feed(&self, feed_id: i64) -> Result<Vec<StoredEntry>>;
    fn entry_count(&self, feed_id: i64) -> Result<i64>;
    fn tags(&self) -> Result<Vec<String>>;
    fn feed_tags(&self, feed_id: i64) -> Result<Vec<String>>;
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}
