use chrono::Local;
use std::sync::Arc;

use cadence::config::Config;
use cadence::error::Result;
use cadence::models::{PostStatus, PostType};
use cadence::notifications::NoopNotifier;
use cadence::scheduler::Scheduler;
use cadence::storage::{PostLedger, SqliteLedger};

/// Trigger a single post immediately, outside any plan
///
/// Manual triggers are always tagged `TEST` so they never skew the
/// scheduled/random counters in the daily statistics.
pub async fn post(config: Config) -> Result<()> {
    println!("Posting now ({})", PostType::Test.as_str());
    println!("Endpoint: {}", config.poster.endpoint);

    let ledger = Arc::new(SqliteLedger::new(&config.database.sqlite_path)?);
    let scheduler = Scheduler::new(config, ledger.clone(), Arc::new(NoopNotifier))?;

    let attempt = scheduler.post_now(PostType::Test).await;

    println!();
    match attempt.status {
        PostStatus::Success => {
            println!("Post delivered successfully");
        }
        PostStatus::Failure => {
            println!("Post failed");
            if let Some(detail) = &attempt.error_detail {
                println!("  Error: {detail}");
            }
        }
    }
    if let Some(source) = &attempt.source_used {
        println!("  Source:  {source}");
    }
    println!("  Content: {}", attempt.content_snapshot);

    let stats = ledger.daily_stats(Local::now().date_naive())?;
    println!();
    println!(
        "Today: {} posts, {} successful, {} failed",
        stats.total_posts, stats.successful_posts, stats.failed_posts
    );

    Ok(())
}
