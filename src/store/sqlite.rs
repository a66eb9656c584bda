use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use rusqlite_migration::{Migrations, M};

use crate::app::{EstuaryError, Result};
use crate::domain::{
    ConditionalTokens, FeedMeta, FeedRun, FetchedFeed, StoredEntry, StoredFeed, SyncState,
};
use crate::store::{CommitReport, SearchHit, Store};
use crate::watermark;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the store, creating the schema, full-text index and its
    /// synchronization triggers on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "DELETE", |row| row.get(0))?;
        tracing::debug!("SQLite journal mode: {}", mode);

        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);
        migrations
            .to_latest(&mut conn)
            .map_err(|e| EstuaryError::Migration(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Releases the handle, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().map_err(|e| {
            EstuaryError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })?;
        conn.close().map_err(|(_, e)| EstuaryError::Database(e))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            EstuaryError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn from_seconds(secs: i64) -> Option<DateTime<Utc>> {
    (secs > 0)
        .then(|| DateTime::from_timestamp(secs, 0))
        .flatten()
}

/// Writes one feed's share of the run inside the shared transaction and
/// returns its store identity.
fn commit_feed(
    tx: &Transaction<'_>,
    run: &FeedRun,
    now: DateTime<Utc>,
    report: &mut CommitReport,
) -> Result<i64> {
    let url = run.feed.url();
    let incoming_title = run.incoming_title();

    let feed_id = match run.feed.id {
        Some(id) => id,
        None => {
            tx.prepare_cached("INSERT INTO feeds (title, url) VALUES (?1, ?2)")?
                .execute(params![incoming_title, url])?;
            let id = tx.last_insert_rowid();
            tx.prepare_cached("INSERT INTO feeds_metadata (feedid) VALUES (?1)")?
                .execute(params![id])?;
            tx.prepare_cached("INSERT INTO feeds_details (feedid) VALUES (?1)")?
                .execute(params![id])?;
            report.feeds_created += 1;
            tracing::info!("Created feed {} ({})", id, url);
            id
        }
    };

    if let Some(title) = incoming_title {
        tx.prepare_cached("UPDATE feeds SET title = ?1 WHERE id = ?2 AND title IS NOT ?1")?
            .execute(params![title, feed_id])?;
    }

    let Some(fetched) = run.fetched() else {
        tracing::debug!("{}: {}, no metadata or entries written", url, run.status());
        return Ok(feed_id);
    };

    commit_fetched(tx, feed_id, fetched, now, report)?;
    Ok(feed_id)
}

fn commit_fetched(
    tx: &Transaction<'_>,
    feed_id: i64,
    fetched: &FetchedFeed,
    now: DateTime<Utc>,
    report: &mut CommitReport,
) -> Result<()> {
    let ConditionalTokens {
        etag,
        last_modified,
    } = &fetched.tokens;
    tx.prepare_cached(
        "UPDATE feeds_metadata SET lastfetch = ?1, lastmodified = ?2, etag = ?3 WHERE feedid = ?4",
    )?
    .execute(params![
        now.timestamp(),
        last_modified.as_deref().unwrap_or_default(),
        etag.as_deref().unwrap_or_default(),
        feed_id
    ])?;

    let meta = &fetched.meta;
    tx.prepare_cached(
        "UPDATE feeds_details SET
            home = COALESCE(?1, home),
            description = COALESCE(?2, description),
            language = COALESCE(?3, language),
            image = COALESCE(?4, image),
            author = COALESCE(?5, author)
         WHERE feedid = ?6",
    )?
    .execute(params![
        meta.home,
        meta.description,
        meta.language,
        meta.image,
        meta.author,
        feed_id
    ])?;

    let stored_watermark: i64 = tx
        .prepare_cached("SELECT lastentry FROM feeds_metadata WHERE feedid = ?1")?
        .query_row(params![feed_id], |row| row.get(0))?;
    let (fresh, stale) =
        watermark::retain_new(&fetched.entries, watermark::from_millis(stored_watermark));
    report.entries_stale += stale;

    for entry in fresh {
        let published = watermark::to_millis(entry.published);
        let inserted = tx
            .prepare_cached(
                "INSERT INTO entries (feedid, datemillis, title, url) VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![feed_id, published, entry.title, entry.url]);

        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                let conflict = EstuaryError::EntryConflict(entry.url.clone());
                tracing::warn!("{}", conflict);
                report.entries_conflicted += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        let entry_id = tx.last_insert_rowid();
        tx.prepare_cached(
            "INSERT INTO entries_content (entriesid, title, summary, content) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![entry_id, entry.title, entry.summary, entry.content])?;

        // Conditional so unordered input never moves the watermark back.
        tx.prepare_cached(
            "UPDATE feeds_metadata SET lastentry = ?1 WHERE feedid = ?2 AND lastentry < ?1",
        )?
        .execute(params![published, feed_id])?;

        report.entries_inserted += 1;
    }

    Ok(())
}

/// Drops every tag and association, then inserts the current run's set.
fn replace_tags(conn: &mut Connection, tagged: &[(i64, &[String])]) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute_batch("DELETE FROM feed_tags; DELETE FROM tags;")?;

    let mut tag_ids: HashMap<&str, i64> = HashMap::new();
    for (feed_id, tags) in tagged {
        for name in tags.iter() {
            let tag_id = match tag_ids.get(name.as_str()) {
                Some(id) => *id,
                None => {
                    tx.prepare_cached("INSERT INTO tags (name) VALUES (?1)")?
                        .execute(params![name])?;
                    let id = tx.last_insert_rowid();
                    tag_ids.insert(name.as_str(), id);
                    id
                }
            };
            tx.prepare_cached("INSERT OR IGNORE INTO feed_tags (feedid, tagid) VALUES (?1, ?2)")?
                .execute(params![feed_id, tag_id])?;
        }
    }

    tx.commit()?;
    Ok(tag_ids.len())
}

/// Turns free text into a single FTS5 phrase string. Keywords and
/// punctuation end up inside the quotes, so they reach the tokenizer
/// instead of the query parser. Empty when nothing searchable is left.
fn sanitize_fts5_query(query: &str) -> String {
    let words: Vec<&str> = query.split_whitespace().collect();
    if !words.iter().any(|w| w.chars().any(char::is_alphanumeric)) {
        return String::new();
    }

    format!("\"{}\"", words.join(" ").replace('"', "\"\""))
}

impl Store for SqliteStore {
    fn load(&self) -> Result<Vec<StoredFeed>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT feeds.id, feeds.url, feeds.title,
                    m.lastentry, m.lastfetch, m.lastmodified, m.etag
             FROM feeds
             JOIN feeds_metadata m ON feeds.id = m.feedid
             ORDER BY feeds.id",
        )?;

        let feeds = stmt
            .query_map([], |row| {
                Ok(StoredFeed {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                    state: SyncState {
                        watermark: watermark::from_millis(row.get(3)?),
                        last_fetch: from_seconds(row.get(4)?),
                        tokens: ConditionalTokens::new(row.get(6)?, row.get(5)?),
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn commit(&self, runs: &[FeedRun]) -> Result<CommitReport> {
        let mut conn = self.lock()?;
        let mut report = CommitReport::default();
        let now = Utc::now();

        // Rolled back on drop if any statement below fails.
        let tx = conn.transaction()?;
        let mut tagged = Vec::with_capacity(runs.len());
        for run in runs {
            let feed_id = commit_feed(&tx, run, now, &mut report)?;
            tagged.push((feed_id, run.feed.tags.as_slice()));
        }
        tx.commit()?;

        report.tags = replace_tags(&mut conn, &tagged)?;

        conn.execute_batch("INSERT INTO search(search) VALUES('optimize'); VACUUM;")?;

        tracing::info!(
            "Committed {} feeds: {} new, {} entries inserted, {} conflicts, {} stale",
            runs.len(),
            report.feeds_created,
            report.entries_inserted,
            report.entries_conflicted,
            report.entries_stale
        );

        Ok(report)
    }

    fn sync_state(&self, feed_id: i64) -> Result<Option<SyncState>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                "SELECT lastentry, lastfetch, lastmodified, etag
                 FROM feeds_metadata WHERE feedid = ?1",
                params![feed_id],
                |row| {
                    Ok(SyncState {
                        watermark: watermark::from_millis(row.get(0)?),
                        last_fetch: from_seconds(row.get(1)?),
                        tokens: ConditionalTokens::new(row.get(3)?, row.get(2)?),
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    fn feed_details(&self, feed_id: i64) -> Result<Option<FeedMeta>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                "SELECT feeds.title, d.description, d.language, d.image, d.home, d.author
                 FROM feeds
                 JOIN feeds_details d ON feeds.id = d.feedid
                 WHERE feeds.id = ?1",
                params![feed_id],
                |row| {
                    Ok(FeedMeta {
                        title: row.get(0)?,
                        description: row.get(1)?,
                        language: row.get(2)?,
                        image: row.get(3)?,
                        home: row.get(4)?,
                        author: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    fn entries_for_feed(&self, feed_id: i64) -> Result<Vec<StoredEntry>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT e.id, e.feedid, e.datemillis, e.title, e.url, c.summary, c.content
             FROM entries e
             LEFT JOIN entries_content c ON c.entriesid = e.id
             WHERE e.feedid = ?1
             ORDER BY e.datemillis DESC",
        )?;

        let entries = stmt
            .query_map(params![feed_id], |row| {
                Ok(StoredEntry {
                    id: row.get(0)?,
                    feed_id: row.get(1)?,
                    published: watermark::from_millis(row.get(2)?),
                    title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    url: row.get(4)?,
                    summary: row.get(5)?,
                    content: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn entry_count(&self, feed_id: i64) -> Result<i64> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE feedid = ?1",
            params![feed_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    fn tags(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(tags)
    }

    fn feed_tags(&self, feed_id: i64) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN feed_tags ft ON ft.tagid = t.id
             WHERE ft.feedid = ?1
             ORDER BY t.name",
        )?;
        let tags = stmt
            .query_map(params![feed_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(tags)
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let expression = sanitize_fts5_query(query);
        if expression.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT e.id, e.feedid, e.datemillis, e.title, e.url
             FROM search
             JOIN entries e ON e.id = search.rowid
             WHERE search MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;

        let hits = stmt
            .query_map(params![expression, limit as i64], |row| {
                Ok(SearchHit {
                    entry_id: row.get(0)?,
                    feed_id: row.get(1)?,
                    published: watermark::from_millis(row.get(2)?),
                    title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    url: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(hits)
    }
}
