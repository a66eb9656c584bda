use std::sync::Arc;

use crate::app::error::Result;
use crate::config::{Config, SubscriptionList};
use crate::convert::{Html2TextConverter, TextConverter};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::store::sqlite::SqliteStore;
use crate::sync::{SyncOrchestrator, SyncReport};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub parallel_fetcher: ParallelFetcher,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.database_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Arc::new(SqliteStore::open(&db_path)?);
        tracing::debug!("Opened store at {}", db_path.display());
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_options(
            config.timeout(),
            &config.user_agent,
        )?);
        let converter: Arc<dyn TextConverter> = Arc::new(Html2TextConverter::new());
        let parallel_fetcher =
            ParallelFetcher::with_workers(fetcher, converter, config.workers);

        Ok(Self {
            config,
            store,
            parallel_fetcher,
        })
    }

    pub fn load_subscriptions(&self) -> Result<SubscriptionList> {
        let path = self.config.subscriptions_path()?;
        Ok(SubscriptionList::load(&path)?)
    }

    pub async fn sync(&self) -> Result<SyncReport> {
        let subscriptions = self.load_subscriptions()?;
        SyncOrchestrator::new(self.store.as_ref(), &self.parallel_fetcher)
            .run(&subscriptions)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::path::PathBuf;

    #[test]
    fn test_in_memory_context_starts_empty() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        assert!(ctx.store.load().unwrap().is_empty());
    }

    #[test]
    fn test_missing_subscription_file_is_fatal() {
        let config = Config {
            subscriptions: Some(PathBuf::from("/nonexistent/subs.json")),
            ..Config::default()
        };
        let ctx = AppContext::in_memory(config).unwrap();
        let err = ctx.load_subscriptions().unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_file_store_created_under_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database: Some(dir.path().join("nested").join("estuary.db")),
            ..Config::default()
        };
        let ctx = AppContext::new(config).unwrap();
        assert!(ctx.store.load().unwrap().is_empty());
        assert!(dir.path().join("nested").join("estuary.db").exists());
    }
}
