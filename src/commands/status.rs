use chrono::Local;

use cadence::config::Config;
use cadence::error::Result;
use cadence::storage::{PostLedger, SqliteLedger};

/// Print today's posting statistics and recent attempts
pub fn status(config: Config, recent: usize) -> Result<()> {
    let db_path = &config.database.sqlite_path;
    if !db_path.exists() {
        println!("Database not found: {}", db_path.display());
        println!("Run the scheduler first to create it.");
        return Ok(());
    }

    let ledger = SqliteLedger::new(db_path)?;
    let today = Local::now().date_naive();
    let stats = ledger.daily_stats(today)?;

    println!("Posting Status");
    println!("==============");
    println!("Database: {}", db_path.display());
    println!("Date:     {today}");
    println!();
    println!("Total posts: {}", stats.total_posts);
    println!("  Success:   {}", stats.successful_posts);
    println!("  Failed:    {}", stats.failed_posts);
    println!("  Scheduled: {}", stats.scheduled_posts);
    println!("  Random:    {}", stats.random_posts);
    println!("Success rate: {:.1}%", stats.success_rate() * 100.0);

    if let Some(last) = ledger.last_post_time(today)? {
        println!("Last post:    {}", last.format("%H:%M:%S"));
    } else {
        println!("Last post:    none today");
    }

    let attempts = ledger.recent_attempts(recent)?;
    if !attempts.is_empty() {
        println!();
        println!("Recent Attempts");
        println!("---------------");
        for attempt in attempts {
            let source = attempt.source_used.as_deref().unwrap_or("-");
            println!(
                "{}  {:9}  {:7}  {}",
                attempt.executed_at.format("%Y-%m-%d %H:%M:%S"),
                attempt.post_type.as_str(),
                attempt.status.as_str(),
                source
            );
            if let Some(detail) = &attempt.error_detail {
                println!("    {detail}");
            }
        }
    }

    Ok(())
}
