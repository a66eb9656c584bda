//! Per-feed watermark: the publication time at or below which entries are
//! considered already synchronized.

use chrono::{DateTime, Utc};

use crate::domain::Entry;

pub fn is_new(published: DateTime<Utc>, watermark: DateTime<Utc>) -> bool {
    published > watermark
}

/// Keeps the entries published strictly after `watermark`, in input order.
/// Returns the survivors and how many were dropped.
pub fn retain_new(entries: &[Entry], watermark: DateTime<Utc>) -> (Vec<&Entry>, usize) {
    let fresh: Vec<&Entry> = entries
        .iter()
        .filter(|entry| is_new(entry.published, watermark))
        .collect();
    let dropped = entries.len() - fresh.len();
    (fresh, dropped)
}

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
