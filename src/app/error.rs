use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum EstuaryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema migration error: {0}")]
    Migration(String),

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Feed unchanged: {0}")]
    Unchanged(String),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Content conversion error: {0}")]
    Conversion(String),

    #[error("Entry already stored: {0}")]
    EntryConflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EstuaryError {
    pub fn network(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Whether the error is absorbed at feed or entry granularity instead of
    /// terminating the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Unchanged(_)
                | Self::FeedParse(_)
                | Self::Conversion(_)
                | Self::EntryConflict(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EstuaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_level_errors_are_recoverable() {
        assert!(EstuaryError::network("https://x/feed", "timed out").is_recoverable());
        assert!(EstuaryError::Unchanged("https://x/feed".into()).is_recoverable());
        assert!(EstuaryError::Conversion("bad markup".into()).is_recoverable());
        assert!(EstuaryError::EntryConflict("https://x/1".into()).is_recoverable());
    }

    #[test]
    fn test_store_and_config_errors_are_fatal() {
        assert!(!EstuaryError::Database(rusqlite::Error::InvalidQuery).is_recoverable());
        assert!(!EstuaryError::Migration("boom".into()).is_recoverable());
        assert!(!EstuaryError::Config(ConfigError::NoConfigDir).is_recoverable());
    }

    #[test]
    fn test_network_error_message() {
        let err = EstuaryError::network("https://x/feed", "connection refused");
        assert_eq!(
            err.to_string(),
            "Network error for https://x/feed: connection refused"
        );
    }
}
