//! Subscription document loading.
//!
//! The document lists every feed to sync along with its normalization
//! rules. JSON uses `{"feeds": [...]}`; TOML uses `[[feeds]]` tables.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use url::Url;

use super::ConfigError;
use crate::domain::Subscription;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscriptionList {
    #[serde(default)]
    pub feeds: Vec<Subscription>,
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

impl SubscriptionList {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let list = match Format::from_path(path) {
            Format::Json => serde_json::from_str::<Self>(&content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str::<Self>(&content).map_err(|e| e.to_string()),
        }
        .map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        list.validate()?;
        tracing::debug!("Loaded {} subscriptions from {}", list.feeds.len(), path.display());
        Ok(list)
    }

    /// Every address must be an absolute URL and appear only once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for feed in &self.feeds {
            Url::parse(&feed.url)
                .map_err(|e| ConfigError::Invalid(format!("feed url {:?}: {}", feed.url, e)))?;

            if !seen.insert(feed.url.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "feed url {:?} listed more than once",
                    feed.url
                )));
            }

            if let Some(range) = feed
                .content_exclude
                .iter()
                .find(|r| r.from.is_empty() || r.to.is_empty())
            {
                return Err(ConfigError::Invalid(format!(
                    "feed {:?}: exclusion range {:?}..{:?} needs both markers",
                    feed.url, range.from, range.to
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExcludeRange;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "subs.json",
            r#"{"feeds": [
                {"url": "https://x/feed", "tags": ["tech"]},
                {"url": "https://y/feed", "title": "Y", "content_end_mark": ["--"]}
            ]}"#,
        );

        let list = SubscriptionList::load(&path).unwrap();
        assert_eq!(list.feeds.len(), 2);
        assert_eq!(list.feeds[0].tags, vec!["tech"]);
        assert_eq!(list.feeds[1].content_end_marks, vec!["--"]);
    }

    #[test]
    fn test_load_toml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "subs.toml",
            r#"
[[feeds]]
url = "https://x/feed"
trim_prefixes = ["Podcast:"]

[[feeds.content_exclude]]
from = "START"
to = "END"
"#,
        );

        let list = SubscriptionList::load(&path).unwrap();
        assert_eq!(list.feeds[0].trim_prefixes, vec!["Podcast:"]);
        assert_eq!(
            list.feeds[0].content_exclude,
            vec![ExcludeRange {
                from: "START".into(),
                to: "END".into()
            }]
        );
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let list = SubscriptionList {
            feeds: vec![
                Subscription::new("https://x/feed"),
                Subscription::new("https://x/feed"),
            ],
        };
        assert!(matches!(list.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_relative_url_rejected() {
        let list = SubscriptionList {
            feeds: vec![Subscription::new("x/feed")],
        };
        assert!(matches!(list.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_url_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "subs.json", r#"{"feeds": [{"title": "No address"}]}"#);
        assert!(matches!(
            SubscriptionList::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SubscriptionList::load(&dir.path().join("absent.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
