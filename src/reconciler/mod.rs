//! Turns the raw items of one fetched feed into cleaned entries.
//!
//! Per item, in order: drop anything at or below the watermark, apply the
//! episode allow/deny lists, normalize the title, resolve the link,
//! reconcile summary/content, cut trailing boilerplate and excise the
//! configured line ranges. A conversion failure aborts the whole feed.

pub mod fields;
pub mod text;

use chrono::{DateTime, Utc};

use crate::app::{EstuaryError, Result};
use crate::convert::TextConverter;
use crate::domain::{Entry, FeedMeta, RawItem, Subscription};
use crate::normalizer::ParsedFeed;
use crate::watermark;

pub use fields::{hamming_similarity, reconcile_fields, Alternates, Fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySeen,
    NoTimestamp,
    Filtered,
    NoLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub title: String,
    pub reason: SkipReason,
}

enum Decision {
    Accept(Entry),
    Skip(Skipped),
}

/// Cleaned entries plus the feed's refreshed metadata.
#[derive(Debug, Clone, Default)]
pub struct ReconciledFeed {
    pub meta: FeedMeta,
    pub entries: Vec<Entry>,
    pub skipped: Vec<Skipped>,
}

pub struct ItemReconciler<'a> {
    rules: &'a Subscription,
    converter: &'a dyn TextConverter,
}

impl<'a> ItemReconciler<'a> {
    pub fn new(rules: &'a Subscription, converter: &'a dyn TextConverter) -> Self {
        Self { rules, converter }
    }

    pub fn reconcile(&self, parsed: ParsedFeed, watermark: DateTime<Utc>) -> Result<ReconciledFeed> {
        // Item titles repeat the title the source publishes, not our label.
        let feed_title = parsed
            .meta
            .title
            .clone()
            .or_else(|| self.rules.configured_title().map(String::from))
            .unwrap_or_default();

        let (entries, skipped) = parsed.items.into_iter().try_fold(
            (Vec::new(), Vec::new()),
            |(mut entries, mut skipped), item| {
                match self.reconcile_item(item, &feed_title, watermark)? {
                    Decision::Accept(entry) => entries.push(entry),
                    Decision::Skip(skip) => {
                        tracing::debug!("Skipping '{}': {:?}", skip.title, skip.reason);
                        skipped.push(skip);
                    }
                }
                Ok::<_, EstuaryError>((entries, skipped))
            },
        )?;

        Ok(ReconciledFeed {
            meta: parsed.meta,
            entries,
            skipped,
        })
    }

    fn reconcile_item(
        &self,
        item: RawItem,
        feed_title: &str,
        watermark: DateTime<Utc>,
    ) -> Result<Decision> {
        let skip = |reason| {
            Ok(Decision::Skip(Skipped {
                title: item.title.clone(),
                reason,
            }))
        };

        let Some(published) = item.published else {
            return skip(SkipReason::NoTimestamp);
        };
        if !watermark::is_new(published, watermark) {
            return skip(SkipReason::AlreadySeen);
        }
        if !text::passes_episode_filters(
            &item.title,
            &self.rules.episode_allowlist,
            &self.rules.episode_denylist,
        ) {
            return skip(SkipReason::Filtered);
        }
        let Some(url) = text::resolve_link(&item) else {
            return skip(SkipReason::NoLink);
        };

        let title = text::normalize_title(
            &item.title,
            feed_title,
            &self.rules.trim_prefixes,
            &self.rules.trim_suffixes,
        );

        let alternates = Alternates {
            subtitle: item.alt_subtitle.as_deref(),
            summary: item.alt_summary.as_deref(),
        };
        let fields = reconcile_fields(
            item.summary.as_deref().unwrap_or_default(),
            item.content.as_deref().unwrap_or_default(),
            alternates,
            self.converter,
            hamming_similarity,
        )?;

        let content = text::trim_at_marks(&fields.content, &self.rules.content_end_marks);
        let content = text::exclude_ranges(&content, &self.rules.content_exclude);

        Ok(Decision::Accept(Entry {
            published,
            title,
            url,
            summary: fields.summary().map(String::from),
            content,
        }))
    }
}
