use std::sync::Arc;
use tokio::sync::watch;

use cadence::config::Config;
use cadence::error::Result;
use cadence::notifications::{Notifier, NoopNotifier, WebhookNotifier};
use cadence::scheduler::Scheduler;
use cadence::storage::SqliteLedger;

/// Start the scheduler loop and run until Ctrl+C
pub async fn run(config: Config) -> Result<()> {
    println!("Starting cadence scheduler");
    println!("==========================");
    println!("Fixed slot:       {}", config.schedule.fixed_time);
    println!("Random posts/day: {}", config.schedule.random_posts_per_day);
    println!(
        "Interval range:   {}..{} minutes",
        config.schedule.min_interval_minutes, config.schedule.max_interval_minutes
    );
    println!("Endpoint:         {}", config.poster.endpoint);
    println!("Database:         {}", config.database.sqlite_path.display());

    let ledger = Arc::new(SqliteLedger::new(&config.database.sqlite_path)?);

    let notifier: Arc<dyn Notifier> = match &config.notify.webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Webhook notifications enabled");
            Arc::new(WebhookNotifier::new(url)?)
        }
        None => Arc::new(NoopNotifier),
    };

    let scheduler = Scheduler::new(config, ledger, notifier)?;

    if scheduler.probe_endpoint().await {
        tracing::info!("Posting endpoint is reachable");
    } else {
        tracing::warn!("Posting endpoint did not respond, continuing anyway");
        println!("Warning: posting endpoint did not respond to probe");
    }

    // Ctrl+C flips the watch channel; the loop finishes any in-flight
    // post before exiting.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, requesting shutdown");
            let _ = shutdown_tx.send(true);
        }
    });

    println!("\nScheduler running. Press Ctrl+C to stop.");
    scheduler.run(shutdown_rx).await?;

    println!("Scheduler stopped.");
    Ok(())
}
