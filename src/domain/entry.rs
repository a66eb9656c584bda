use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item as handed over by the feed parser, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub title: String,
    pub link: Option<String>,
    pub enclosures: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    /// Short-form text (RSS description, Atom summary).
    pub summary: Option<String>,
    /// Long-form text (content:encoded, Atom content).
    pub content: Option<String>,
    pub alt_subtitle: Option<String>,
    pub alt_summary: Option<String>,
}

/// A cleaned entry ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub published: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub content: String,
}

/// An entry as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: i64,
    pub feed_id: i64,
    pub published: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub content: String,
}
