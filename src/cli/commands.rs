use crate::app::{AppContext, Result};
use crate::store::Store;
use crate::watermark;

pub async fn sync_feeds(ctx: &AppContext) -> Result<()> {
    let report = ctx.sync().await?;

    if report.feeds.is_empty() {
        println!("No subscriptions to sync");
        return Ok(());
    }

    let total = report.feeds.len();
    for (i, feed) in report.feeds.iter().enumerate() {
        match &feed.message {
            Some(message) if feed.status == "ERROR" => println!(
                "{}/{} {} ({}) due ({})",
                i + 1,
                total,
                feed.status,
                feed.url,
                message
            ),
            _ => println!("{}/{} {} ({})", i + 1, total, feed.status, feed.url),
        }
    }

    let commit = &report.commit;
    println!(
        "Sync complete: {} ok, {} unchanged, {} errors; {} new entries, {} new feeds",
        report.count("OK"),
        report.count("UNCHANGED"),
        report.count("ERROR"),
        commit.entries_inserted,
        commit.feeds_created
    );
    if commit.entries_conflicted > 0 {
        println!("  {} entries skipped as already stored", commit.entries_conflicted);
    }

    Ok(())
}

pub fn search(ctx: &AppContext, query: &str, limit: usize) -> Result<()> {
    let hits = ctx.store.search(query, limit)?;

    if hits.is_empty() {
        println!("No matches for {:?}", query);
        return Ok(());
    }

    for hit in hits {
        println!(
            "[{}] {}\n  {}",
            hit.published.format("%Y-%m-%d"),
            hit.title,
            hit.url
        );
    }

    Ok(())
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.load()?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        let count = ctx.store.entry_count(feed.id)?;
        let tags = ctx.store.feed_tags(feed.id)?;
        let newest = if watermark::to_millis(feed.state.watermark) == 0 {
            "never".to_string()
        } else {
            feed.state.watermark.format("%Y-%m-%d %H:%M").to_string()
        };

        println!(
            "{} ({} entries, newest {})\n  {}\n  tags: {}",
            feed.title.as_deref().unwrap_or(&feed.url),
            count,
            newest,
            feed.url,
            tags.join(", ")
        );
    }

    Ok(())
}
