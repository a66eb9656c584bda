use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named line range removed from entry content, boundaries inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRange {
    pub from: String,
    pub to: String,
}

/// One feed as declared in the subscription document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub trim_prefixes: Vec<String>,
    #[serde(default)]
    pub trim_suffixes: Vec<String>,
    #[serde(default, rename = "episode_whitelist")]
    pub episode_allowlist: Vec<String>,
    #[serde(default, rename = "episode_blacklist")]
    pub episode_denylist: Vec<String>,
    #[serde(default, rename = "content_end_mark")]
    pub content_end_marks: Vec<String>,
    #[serde(default)]
    pub content_exclude: Vec<ExcludeRange>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Subscription {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Configured display title, if it carries any text.
    pub fn configured_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Entity-tag / last-modified pair used for conditional fetching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalTokens {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl ConditionalTokens {
    pub fn new(etag: Option<String>, last_modified: Option<String>) -> Self {
        // An empty stored token means nothing was ever recorded.
        Self {
            etag: etag.filter(|v| !v.is_empty()),
            last_modified: last_modified.filter(|v| !v.is_empty()),
        }
    }
}

/// Per-feed synchronization bookkeeping, one-to-one with a stored feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub last_fetch: Option<DateTime<Utc>>,
    pub tokens: ConditionalTokens,
    /// Publication time of the newest entry committed so far.
    pub watermark: DateTime<Utc>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_fetch: None,
            tokens: ConditionalTokens::default(),
            watermark: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// A feed row joined with its sync state, as loaded from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFeed {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub state: SyncState,
}

/// Descriptive metadata refreshed from a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub image: Option<String>,
    pub home: Option<String>,
    pub author: Option<String>,
}

/// A subscription carried forward with whatever the store already knows
/// about it. `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFeed {
    pub id: Option<i64>,
    pub subscription: Subscription,
    pub state: SyncState,
    pub tags: Vec<String>,
}

impl TrackedFeed {
    pub fn new(subscription: Subscription) -> Self {
        let tags = subscription.tags.clone();
        Self {
            id: None,
            subscription,
            state: SyncState::default(),
            tags,
        }
    }

    pub fn url(&self) -> &str {
        &self.subscription.url
    }

    pub fn display_title(&self) -> &str {
        self.subscription
            .configured_title()
            .unwrap_or(&self.subscription.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_json_keys() {
        let json = r#"{
            "url": "https://x/feed",
            "title": "My Show",
            "episode_whitelist": ["Interview"],
            "episode_blacklist": ["Trailer"],
            "content_end_mark": ["== STOP =="],
            "content_exclude": [{"from": "START", "to": "END"}],
            "tags": ["tech"]
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();

        assert_eq!(sub.url, "https://x/feed");
        assert_eq!(sub.episode_allowlist, vec!["Interview"]);
        assert_eq!(sub.episode_denylist, vec!["Trailer"]);
        assert_eq!(sub.content_end_marks, vec!["== STOP =="]);
        assert_eq!(
            sub.content_exclude,
            vec![ExcludeRange {
                from: "START".into(),
                to: "END".into()
            }]
        );
        assert!(sub.trim_prefixes.is_empty());
    }

    #[test]
    fn test_configured_title_ignores_blank() {
        let mut sub = Subscription::new("https://x/feed");
        assert_eq!(sub.configured_title(), None);
        sub.title = Some("   ".into());
        assert_eq!(sub.configured_title(), None);
        sub.title = Some(" My Show ".into());
        assert_eq!(sub.configured_title(), Some("My Show"));
    }

    #[test]
    fn test_empty_tokens_are_absent() {
        let tokens = ConditionalTokens::new(Some(String::new()), Some("Mon".into()));
        assert_eq!(tokens.etag, None);
        assert_eq!(tokens.last_modified, Some("Mon".into()));
    }

    #[test]
    fn test_default_watermark_is_epoch() {
        assert_eq!(SyncState::default().watermark.timestamp_millis(), 0);
    }
}
