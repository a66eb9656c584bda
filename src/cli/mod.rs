pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "estuary")]
#[command(about = "Incremental feed sync into a searchable SQLite store", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/estuary/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store file, overriding the config
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Subscription document (JSON or TOML), overriding the config
    #[arg(short, long, global = true)]
    pub subscriptions: Option<PathBuf>,

    /// Number of parallel workers for fetching feeds
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every subscription and commit new entries
    Sync,
    /// Full-text search over stored entries
    Search {
        /// Words to look for in titles and content
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// List stored feeds with their sync state
    Feeds,
}

impl Cli {
    /// Flags given on the command line take precedence over the file.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if let Some(subscriptions) = &self.subscriptions {
            config.subscriptions = Some(subscriptions.clone());
        }
        if let Some(workers) = self.workers {
            config.workers = workers.max(1);
        }
        config
    }
}
