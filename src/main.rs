use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use estuary::app::AppContext;
use estuary::cli::{commands, Cli, Commands};
use estuary::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(cli.apply(config))?;

    match cli.command {
        Commands::Sync => {
            commands::sync_feeds(&ctx).await?;
        }
        Commands::Search { query, limit } => {
            commands::search(&ctx, &query, limit)?;
        }
        Commands::Feeds => {
            commands::list_feeds(&ctx)?;
        }
    }

    Ok(())
}
