//! The scheduling loop
//!
//! A single loop owns the day's plan and drives each fired slot through
//! content resolution, submission and the one ledger write. Pipelines for
//! different slots never overlap: a fired slot runs to its terminal
//! outcome before the loop waits again, which is what makes the
//! one-row-per-trigger guarantee trivial. A stop signal during a wait
//! ends the loop cleanly; during a firing it lets the in-flight attempt
//! finish first so no partial row is ever written.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::content::{ContentResolver, HttpContentSource};
use crate::models::{PostAttempt, PostStatus, PostType};
use crate::notifications::Notifier;
use crate::poster::{PostPayload, Submitter};
use crate::storage::PostLedger;

use super::error::{SchedulerError, SchedulerResult};
use super::planner::{self, DailyPlan, PlanSnapshot, SlotId};

/// Send the "upcoming post" notification this far ahead of a slot
fn upcoming_notice() -> ChronoDuration {
    ChronoDuration::hours(1)
}

/// Owns the daily plan and runs the trigger loop
pub struct Scheduler {
    config: Config,
    fixed_time: NaiveTime,
    resolver: ContentResolver,
    submitter: Submitter,
    ledger: Arc<dyn PostLedger>,
    notifier: Arc<dyn Notifier>,
    plan: RwLock<DailyPlan>,
}

impl Scheduler {
    /// Build the full pipeline from configuration
    pub fn new(
        config: Config,
        ledger: Arc<dyn PostLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> SchedulerResult<Self> {
        let fixed_time = NaiveTime::parse_from_str(&config.schedule.fixed_time, "%H:%M")
            .map_err(|_| SchedulerError::InvalidFixedTime(config.schedule.fixed_time.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(config.source_timeout())
            .user_agent(format!("cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let sources = HttpContentSource::catalog(&config.content.sources, &client);
        let resolver = ContentResolver::new(sources, config.source_timeout());

        let submitter = Submitter::new(config.poster.clone(), config.retry.to_retry_config())?;

        let plan = RwLock::new(DailyPlan::empty(Local::now().date_naive()));

        Ok(Self {
            config,
            fixed_time,
            resolver,
            submitter,
            ledger,
            notifier,
            plan,
        })
    }

    /// Check whether the posting endpoint answers at all
    pub async fn probe_endpoint(&self) -> bool {
        self.submitter.probe().await
    }

    /// Read-only copy of the current plan for status reporting
    pub async fn plan_snapshot(&self) -> PlanSnapshot {
        self.plan.read().await.snapshot()
    }

    /// Run the scheduling loop until `shutdown` flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SchedulerResult<()> {
        self.replan().await;
        let mut notified_slot: Option<SlotId> = None;

        loop {
            if *shutdown.borrow() {
                info!("Stop signal received, scheduler loop ending");
                return Ok(());
            }

            let now = Local::now().naive_local();

            // Day rollover: a stale plan is discarded wholesale
            if self.plan.read().await.date != now.date() {
                info!("Day rollover detected");
                self.replan().await;
                notified_slot = None;
                continue;
            }

            let next = self.plan.read().await.next_unconsumed();

            match next {
                Some((slot_id, at)) => {
                    // Advance warning once per slot when the wait allows
                    if notified_slot != Some(slot_id) && at - now > upcoming_notice() {
                        let warn_at = at - upcoming_notice();
                        if !self.wait_until(warn_at, &mut shutdown).await {
                            info!("Stop signal received while waiting, scheduler loop ending");
                            return Ok(());
                        }
                        self.notifier
                            .notify(
                                "Upcoming Post",
                                &format!(
                                    "A {} post is scheduled at {}",
                                    slot_id.post_type(),
                                    at.format("%H:%M")
                                ),
                            )
                            .await;
                        notified_slot = Some(slot_id);
                        continue;
                    }

                    if self.wait_until(at, &mut shutdown).await {
                        self.fire(slot_id, at).await;
                    } else {
                        info!("Stop signal received while waiting, scheduler loop ending");
                        return Ok(());
                    }
                }
                None => {
                    // All of today's slots consumed: idle until midnight,
                    // then plan the next day
                    let midnight =
                        now.date().and_time(NaiveTime::MIN) + ChronoDuration::days(1);
                    info!(until = %midnight, "Plan exhausted, waiting for rollover");
                    if self.wait_until(midnight, &mut shutdown).await {
                        self.replan().await;
                        notified_slot = None;
                    } else {
                        info!("Stop signal received while waiting, scheduler loop ending");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Sleep until `deadline` or until shutdown; returns false on shutdown
    async fn wait_until(&self, deadline: NaiveDateTime, shutdown: &mut watch::Receiver<bool>) -> bool {
        let now = Local::now().naive_local();
        let wait = (deadline - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => true,
            // Any change (or a closed channel) is treated as a stop signal
            _ = shutdown.changed() => false,
        }
    }

    /// Recompute the plan for the current day
    ///
    /// Random posts already recorded today (e.g. before a restart) are
    /// subtracted from the configured budget, so the planner itself stays
    /// a pure function of its inputs. A ledger read failure is logged and
    /// the full budget is assumed; planning never stops the loop.
    async fn replan(&self) {
        let now = Local::now().naive_local();

        let already_posted = match self.ledger.count_for_day(now.date(), Some(PostType::Random)) {
            Ok(n) => n as usize,
            Err(e) => {
                error!(error = %e, "Ledger read failed during planning, assuming full budget");
                0
            }
        };

        let target = self
            .config
            .schedule
            .random_posts_per_day
            .saturating_sub(already_posted);

        let plan = planner::plan(
            now,
            self.fixed_time,
            target,
            self.config.min_interval(),
            self.config.max_interval(),
        );

        info!(
            date = %plan.date,
            fixed = plan.fixed_slot.map(|t| t.format("%H:%M").to_string()).as_deref().unwrap_or("elapsed"),
            random_slots = plan.random_slots.len(),
            already_posted,
            "Daily plan computed"
        );
        for (i, slot) in plan.random_slots.iter().enumerate() {
            info!(index = i, at = %slot.format("%H:%M:%S"), "Random slot planned");
        }

        *self.plan.write().await = plan;
    }

    /// Fire one slot: consume it, run the pipeline, notify the result
    async fn fire(&self, slot_id: SlotId, planned_at: NaiveDateTime) {
        {
            let mut plan = self.plan.write().await;
            plan.mark_consumed(slot_id);
        }

        let post_type = slot_id.post_type();
        info!(%post_type, planned_at = %planned_at, "Slot fired");

        let attempt = self.execute(post_type, planned_at).await;

        let result_msg = match attempt.status {
            PostStatus::Success => format!("{post_type} post was successful."),
            PostStatus::Failure => format!("{post_type} post failed."),
        };
        let next_msg = match self.plan.read().await.next_unconsumed() {
            Some((_, at)) => format!("Next post scheduled at {}.", at.format("%H:%M")),
            None => String::from("No more posts scheduled today."),
        };

        self.notifier
            .notify("Post Result", &format!("{result_msg}\n{next_msg}"))
            .await;
    }

    /// Run the delivery pipeline for one trigger and record the outcome
    ///
    /// Content resolution cannot fail (it falls back), delivery failures
    /// are absorbed into the attempt's terminal status, and a failed
    /// ledger write is logged without stopping the loop. Exactly one
    /// record call happens per invocation.
    pub async fn execute(&self, post_type: PostType, planned_at: NaiveDateTime) -> PostAttempt {
        let executed_at = Local::now().naive_local();
        let mut attempt = PostAttempt::new(post_type, planned_at, executed_at);

        let resolved = self.resolver.resolve().await;
        if resolved.is_fallback() {
            warn!(%post_type, "Posting fallback content");
        }
        attempt.source_used = Some(resolved.source_used.clone());
        attempt.set_content(&resolved.content);

        let payload = PostPayload::from_resolved(&resolved);
        match self.submitter.submit(&payload).await {
            crate::poster::SubmitOutcome::Success { attempts, status } => {
                info!(%post_type, attempts, status, "Post pipeline succeeded");
                attempt.status = PostStatus::Success;
            }
            crate::poster::SubmitOutcome::Failure { attempts, error } => {
                error!(%post_type, attempts, error = %error, "Post pipeline failed");
                attempt.status = PostStatus::Failure;
                attempt.error_detail = Some(error);
            }
        }

        if let Err(e) = self.ledger.record(&attempt) {
            // Persistence failure must not block the next slot; the row is
            // lost but the loop continues
            error!(error = %e, "Failed to record post attempt");
        }

        attempt
    }

    /// Run one manual trigger immediately, outside the plan
    ///
    /// Manual posts never touch slot consumption; they share the firing
    /// pipeline and the ledger's concurrency guarantees.
    pub async fn post_now(&self, post_type: PostType) -> PostAttempt {
        let now = Local::now().naive_local();
        info!(%post_type, "Manual trigger");

        let attempt = self.execute(post_type, now).await;

        let msg = match attempt.status {
            PostStatus::Success => format!("{post_type} post was successful."),
            PostStatus::Failure => format!("{post_type} post failed."),
        };
        self.notifier.notify("Post Result", &msg).await;

        attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyStats;
    use crate::notifications::NoopNotifier;
    use crate::storage::SqliteLedger;
    use chrono::NaiveDate;

    fn scheduler_with(ledger: Arc<SqliteLedger>) -> Scheduler {
        let mut config = Config::default();
        config.schedule.random_posts_per_day = 5;
        config.content.sources = Vec::new();
        Scheduler::new(config, ledger, Arc::new(NoopNotifier)).unwrap()
    }

    fn recorded_random(ledger: &SqliteLedger, n: usize) {
        let now = Local::now().naive_local();
        for _ in 0..n {
            let mut attempt = PostAttempt::new(PostType::Random, now, now);
            attempt.status = PostStatus::Success;
            attempt.set_content("already posted");
            ledger.record(&attempt).unwrap();
        }
    }

    #[tokio::test]
    async fn test_replan_subtracts_posts_already_made_today() {
        let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
        recorded_random(&ledger, 3);

        let scheduler = scheduler_with(ledger);
        scheduler.replan().await;

        // 5 configured minus 3 recorded leaves at most 2, further reduced
        // only when the remaining day is too short
        let snapshot = scheduler.plan_snapshot().await;
        let random = snapshot
            .slots
            .iter()
            .filter(|s| s.post_type == PostType::Random)
            .count();
        assert!(random <= 2, "expected at most 2 random slots, got {random}");
    }

    #[tokio::test]
    async fn test_replan_exhausted_budget_plans_no_random_slots() {
        let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
        recorded_random(&ledger, 7);

        let scheduler = scheduler_with(ledger);
        scheduler.replan().await;

        let snapshot = scheduler.plan_snapshot().await;
        assert!(snapshot
            .slots
            .iter()
            .all(|s| s.post_type != PostType::Random));
    }

    /// Ledger whose reads always fail, as a locked or corrupted database would
    struct UnreachableLedger;

    impl crate::storage::PostLedger for UnreachableLedger {
        fn record(&self, _attempt: &PostAttempt) -> anyhow::Result<i64> {
            anyhow::bail!("database is locked")
        }
        fn daily_stats(&self, _date: NaiveDate) -> anyhow::Result<DailyStats> {
            anyhow::bail!("database is locked")
        }
        fn recompute_stats(&self, _date: NaiveDate) -> anyhow::Result<DailyStats> {
            anyhow::bail!("database is locked")
        }
        fn count_for_day(
            &self,
            _date: NaiveDate,
            _post_type: Option<PostType>,
        ) -> anyhow::Result<u32> {
            anyhow::bail!("database is locked")
        }
        fn last_post_time(&self, _date: NaiveDate) -> anyhow::Result<Option<NaiveDateTime>> {
            anyhow::bail!("database is locked")
        }
        fn recent_attempts(&self, _limit: usize) -> anyhow::Result<Vec<PostAttempt>> {
            anyhow::bail!("database is locked")
        }
    }

    #[tokio::test]
    async fn test_planning_survives_ledger_read_failure() {
        let mut config = Config::default();
        config.content.sources = Vec::new();
        let scheduler =
            Scheduler::new(config, Arc::new(UnreachableLedger), Arc::new(NoopNotifier)).unwrap();

        // Planning assumes the full budget instead of failing
        scheduler.replan().await;
        let snapshot = scheduler.plan_snapshot().await;
        assert_eq!(snapshot.date, Local::now().date_naive());

        // The loop itself must come up and honor the stop signal, not error out
        let (_tx, rx) = watch::channel(true);
        scheduler.run(rx).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_returns_on_preset_stop_signal() {
        let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
        let scheduler = scheduler_with(ledger);

        let (tx, rx) = watch::channel(true);
        scheduler.run(rx).await.unwrap();
        drop(tx);
    }

    #[test]
    fn test_invalid_fixed_time_rejected() {
        let mut config = Config::default();
        config.schedule.fixed_time = String::from("25:99");
        let ledger = Arc::new(SqliteLedger::in_memory().unwrap());

        let result = Scheduler::new(config, ledger, Arc::new(NoopNotifier));
        assert!(matches!(result, Err(SchedulerError::InvalidFixedTime(_))));
    }
}
