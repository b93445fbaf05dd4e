//! # Scrape Scheduler
//!
//! Background task that fires the three job kinds on their fixed cadences.
//! Each cadence ticks independently; a tick only ever asks the engine to
//! start a run, and the engine's single-flight guard decides whether it
//! actually does. Ticks missed while a run overlaps its own cadence are
//! skipped, not queued.

use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::SchedulerConfig;
use crate::engine::{ScrapeEngine, TriggerOutcome};
use crate::run_log::JobKind;

/// Background scheduler service.
pub struct ScrapeScheduler {
    engine: Arc<ScrapeEngine>,
    config: SchedulerConfig,
}

impl ScrapeScheduler {
    /// Create a new scheduler instance.
    pub fn new(engine: Arc<ScrapeEngine>, config: SchedulerConfig) -> Self {
        Self { engine, config }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    ///
    /// Every cadence fires once immediately on startup, so a freshly booted
    /// process pulls rankings and sweeps lifecycles without waiting out the
    /// first interval.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            ranking_interval_seconds = self.config.ranking_interval_seconds,
            live_interval_seconds = self.config.live_interval_seconds,
            lifecycle_interval_seconds = self.config.lifecycle_interval_seconds,
            "Starting scrape scheduler"
        );

        let mut ranking = interval(Duration::from_secs(self.config.ranking_interval_seconds));
        let mut live = interval(Duration::from_secs(self.config.live_interval_seconds));
        let mut sweep = interval(Duration::from_secs(self.config.lifecycle_interval_seconds));
        for timer in [&mut ranking, &mut live, &mut sweep] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Scrape scheduler shutdown requested");
                    break;
                }
                _ = ranking.tick() => self.fire(JobKind::RankingRefresh),
                _ = live.tick() => self.fire(JobKind::LiveScores),
                _ = sweep.tick() => self.fire(JobKind::LifecycleSweep),
            }
        }

        info!("Scrape scheduler stopped");
    }

    fn fire(&self, kind: JobKind) {
        match self.engine.trigger(kind) {
            TriggerOutcome::Started => debug!(job = %kind, "Scheduled trigger started a run"),
            TriggerOutcome::Skipped => {
                debug!(job = %kind, "Scheduled trigger skipped, run still in flight");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::config::AppConfig;

    async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options)
            .await
            .expect("Failed to connect to test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
    }

    fn quiet_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.scheduler.ranking_interval_seconds = 3600;
        config.scheduler.live_interval_seconds = 3600;
        config.scheduler.lifecycle_interval_seconds = 3600;
        config.fetch.max_retries = 0;
        config.fetch.retry_backoff_ms = 100;
        config
    }

    #[tokio::test]
    async fn scheduler_stops_promptly_on_cancel() {
        let db = setup_test_db().await;
        let config = quiet_config();
        let engine = Arc::new(ScrapeEngine::new(db, config.clone()));
        let scheduler = ScrapeScheduler::new(engine, config.scheduler);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(shutdown.clone()));

        sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler did not stop after cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn first_ticks_fire_without_waiting_an_interval() {
        let db = setup_test_db().await;
        let config = quiet_config();
        let engine = Arc::new(ScrapeEngine::new(db, config.clone()));
        let scheduler = ScrapeScheduler::new(Arc::clone(&engine), config.scheduler);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(shutdown.clone()));

        // The sweep run touches no network, so its record lands quickly.
        let mut recorded = None;
        for _ in 0..40 {
            sleep(Duration::from_millis(50)).await;
            recorded = engine.last_run(JobKind::LifecycleSweep).await.unwrap();
            if recorded.is_some() {
                break;
            }
        }

        shutdown.cancel();
        let _ = timeout(Duration::from_secs(2), handle).await;

        let record = recorded.expect("expected an immediate lifecycle sweep run");
        assert_eq!(record.status, "success");
    }
}
