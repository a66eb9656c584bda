//! # Estuary
//!
//! Incremental feed synchronization into a full-text searchable SQLite store.
//!
//! ## Architecture
//!
//! Each run is a single pipeline over every subscription:
//!
//! ```text
//! Subscriptions + Store snapshot → Change Detector → Normalizer
//!     → Item Reconciler → Watermark Filter → Store commit
//! ```
//!
//! Feeds are probed, fetched and reconciled concurrently; nothing is written
//! until all of them have finished, then one transaction commits the run.
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch every subscription and store new entries
//! estuary sync --subscriptions feeds.json
//!
//! # Search stored entries
//! estuary search "borrow checker"
//!
//! # Show stored feeds and their watermarks
//! estuary feeds
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// config, store, fetcher, converter.
pub mod app;

/// Command-line interface using clap.
///
/// - `sync` - Run one synchronization pass
/// - `search <query>` - Full-text search over entries
/// - `feeds` - List stored feeds
pub mod cli;

/// Application config and the subscription document.
pub mod config;

/// HTML to plain text conversion behind the
/// [`TextConverter`](convert::TextConverter) trait.
pub mod convert;

/// Core domain models.
///
/// - [`Subscription`](domain::Subscription): a feed and its normalization rules
/// - [`SyncState`](domain::SyncState): conditional tokens and watermark
/// - [`Entry`](domain::Entry): a reconciled item ready to commit
/// - [`FeedRun`](domain::FeedRun): one feed's outcome for the current run
pub mod domain;

/// Change detection and fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for probe and fetch
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent pipeline with semaphore
pub mod fetcher;

/// Feed parsing into raw items with feed-rs.
pub mod normalizer;

/// Per-item filtering, title cleanup and content-field reconciliation.
pub mod reconciler;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation with FTS5
pub mod store;

/// Run orchestration.
pub mod sync;

/// Per-feed publication watermark helpers.
pub mod watermark;
