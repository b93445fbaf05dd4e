//! Scrape engine
//!
//! Owns the three job kinds and everything one run needs: the single-flight
//! guard per kind, the wall-clock budget per run, the session pool, the
//! source registry, and run record bookkeeping. Triggers are fire-and-forget
//! and report only whether a run started or was skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{AppConfig, FetchConfig};
use crate::error::EngineError;
use crate::lifecycle::LifecycleAutomator;
use crate::models::{scrape_run, tournament};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::repositories::TournamentRepository;
use crate::run_log::{JobKind, RunLogSink, RunStats, RunStatus};
use crate::session::SessionPool;
use crate::sources::{
    FetchParams, LIVE_LEADERBOARD, Source, SourceRegistry, WORLD_RANKINGS, fetch_with_retry,
};

/// What a trigger call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    Skipped,
}

impl TriggerOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            TriggerOutcome::Started => "started",
            TriggerOutcome::Skipped => "skipped",
        }
    }
}

/// Single-flight flag for one job kind. Claiming hands out a permit that
/// releases the flag on drop, so a panicking run can never wedge the kind.
#[derive(Clone, Default)]
struct JobGuard {
    running: Arc<AtomicBool>,
}

impl JobGuard {
    fn try_claim(&self) -> Option<JobPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| JobPermit {
                running: Arc::clone(&self.running),
            })
    }
}

struct JobPermit {
    running: Arc<AtomicBool>,
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

type SharedStats = Arc<Mutex<RunStats>>;

/// The scraping and reconciliation engine.
pub struct ScrapeEngine {
    db: DatabaseConnection,
    config: AppConfig,
    registry: Arc<SourceRegistry>,
    sessions: Arc<SessionPool>,
    run_log: RunLogSink,
    ranking_guard: JobGuard,
    live_guard: JobGuard,
    sweep_guard: JobGuard,
}

impl ScrapeEngine {
    /// Build an engine with the production sources from configuration.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let registry = Arc::new(SourceRegistry::from_config(&config.fetch));
        Self::with_registry(db, config, registry)
    }

    /// Build an engine over an explicit source registry.
    pub fn with_registry(
        db: DatabaseConnection,
        config: AppConfig,
        registry: Arc<SourceRegistry>,
    ) -> Self {
        let sessions = Arc::new(SessionPool::new(&config.fetch));
        let run_log = RunLogSink::new(db.clone());
        Self {
            db,
            config,
            registry,
            sessions,
            run_log,
            ranking_guard: JobGuard::default(),
            live_guard: JobGuard::default(),
            sweep_guard: JobGuard::default(),
        }
    }

    /// Fire a job of the given kind. Returns immediately: `Started` when this
    /// call claimed the kind's slot and spawned the run, `Skipped` when a run
    /// of the same kind is still in flight.
    pub fn trigger(self: &Arc<Self>, kind: JobKind) -> TriggerOutcome {
        let labels = vec![("job", kind.as_str().to_string())];
        let Some(permit) = self.guard(kind).try_claim() else {
            info!(job = %kind, "Previous run still in flight, skipping trigger");
            counter!("engine_triggers_skipped_total", &labels).increment(1);
            return TriggerOutcome::Skipped;
        };
        counter!("engine_triggers_started_total", &labels).increment(1);

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            // Dropped on every exit path, panics included.
            let _permit = permit;
            engine.execute(kind).await;
        });
        TriggerOutcome::Started
    }

    /// Tear down shared fetch resources. Called once at process shutdown.
    pub async fn shutdown(&self) {
        self.sessions.shutdown().await;
    }

    /// Most recent run record for a job kind
    pub async fn last_run(
        &self,
        kind: JobKind,
    ) -> Result<Option<scrape_run::Model>, EngineError> {
        Ok(self.run_log.last_run(kind).await?)
    }

    /// Tournaments currently in play
    pub async fn active_tournaments(&self) -> Result<Vec<tournament::Model>, EngineError> {
        Ok(TournamentRepository::new(self.db.clone())
            .list_active()
            .await?)
    }

    fn guard(&self, kind: JobKind) -> &JobGuard {
        match kind {
            JobKind::RankingRefresh => &self.ranking_guard,
            JobKind::LiveScores => &self.live_guard,
            JobKind::LifecycleSweep => &self.sweep_guard,
        }
    }

    fn run_budget(&self, kind: JobKind) -> Duration {
        let sched = &self.config.scheduler;
        let seconds = match kind {
            JobKind::RankingRefresh => sched.ranking_run_timeout_seconds,
            JobKind::LiveScores => sched.live_run_timeout_seconds,
            JobKind::LifecycleSweep => sched.sweep_run_timeout_seconds,
        };
        Duration::from_secs(seconds)
    }

    /// Run one job to completion and write its run record. Progress counters
    /// live behind a shared handle so a timed-out run still reports whatever
    /// it managed to persist before the budget expired.
    #[instrument(skip(self))]
    async fn execute(&self, kind: JobKind) {
        let started_at = Utc::now().fixed_offset();
        let timer = Instant::now();
        let budget = self.run_budget(kind);
        let stats: SharedStats = Arc::new(Mutex::new(RunStats::default()));
        let labels = vec![("job", kind.as_str().to_string())];

        let status = match timeout(budget, self.run(kind, &stats)).await {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                error!(job = %kind, error = %err, "Run failed");
                stats.lock().await.record_error(err.to_string());
                RunStatus::Failed
            }
            Err(_) => {
                warn!(
                    job = %kind,
                    budget_seconds = budget.as_secs(),
                    "Run hit its wall-clock budget, cancelling in-flight fetches"
                );
                counter!("engine_run_timeouts_total", &labels).increment(1);
                RunStatus::Partial
            }
        };

        let stats = stats.lock().await.clone();
        let finished_at = Utc::now().fixed_offset();
        histogram!("engine_run_duration_ms", &labels).record(timer.elapsed().as_millis() as f64);
        counter!("engine_runs_total", &labels).increment(1);
        info!(
            job = %kind,
            status = %status,
            seen = stats.seen,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            errored = stats.errored,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Run finished"
        );
        self.run_log
            .record(kind, status, started_at, finished_at, &stats)
            .await;
    }

    async fn run(&self, kind: JobKind, stats: &SharedStats) -> Result<RunStatus, EngineError> {
        match kind {
            JobKind::RankingRefresh => self.run_ranking_refresh(stats).await,
            JobKind::LiveScores => self.run_live_scores(stats).await,
            JobKind::LifecycleSweep => self.run_lifecycle_sweep(stats).await,
        }
    }

    /// Full pull of the world ranking feed, reconciled record by record.
    async fn run_ranking_refresh(&self, stats: &SharedStats) -> Result<RunStatus, EngineError> {
        let source = self.registry.get(WORLD_RANKINGS)?;
        let outcome = match fetch_with_retry(
            source.as_ref(),
            &self.sessions,
            &FetchParams::default(),
            &self.config.fetch,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "Ranking fetch failed after retries");
                let mut shared = stats.lock().await;
                shared.record_error(err.to_string());
                return Ok(status_from(&shared));
            }
        };

        {
            let mut shared = stats.lock().await;
            shared.seen += outcome.records.len() as u64 + outcome.skipped;
            shared.skipped += outcome.skipped;
        }

        let reconciler = Reconciler::new(self.db.clone(), &self.config.matcher);
        for record in &outcome.records {
            match reconciler.reconcile(record).await {
                Ok(done) => {
                    let mut shared = stats.lock().await;
                    match done.outcome {
                        ReconcileOutcome::Created => shared.created += 1,
                        ReconcileOutcome::Updated => shared.updated += 1,
                    }
                }
                // One bad record never aborts the rest of the run.
                Err(err) => {
                    warn!(player = %record.name, error = %err, "Failed to reconcile record");
                    stats
                        .lock()
                        .await
                        .record_error(format!("{}: {err}", record.name));
                }
            }
        }

        Ok(status_from(&*stats.lock().await))
    }

    /// Leaderboard refresh for every active tournament, fetched concurrently
    /// under a bounded limit. Each tournament is an independent unit: one
    /// failing leaderboard only costs that tournament this run.
    async fn run_live_scores(&self, stats: &SharedStats) -> Result<RunStatus, EngineError> {
        let tournaments = TournamentRepository::new(self.db.clone())
            .list_active()
            .await?;
        if tournaments.is_empty() {
            debug!("No active tournaments, nothing to fetch");
            return Ok(RunStatus::Success);
        }

        let source = self.registry.get(LIVE_LEADERBOARD)?;
        let reconciler = Arc::new(Reconciler::new(self.db.clone(), &self.config.matcher));
        let semaphore = Arc::new(Semaphore::new(
            self.config.scheduler.live_fetch_concurrency,
        ));

        // JoinSet aborts whatever is still in flight if the run is dropped at
        // its wall-clock budget.
        let mut tasks: JoinSet<RunStats> = JoinSet::new();
        for tournament in tournaments {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                stats
                    .lock()
                    .await
                    .record_error("fetch concurrency limiter closed unexpectedly");
                break;
            };

            let source = Arc::clone(&source);
            let sessions = Arc::clone(&self.sessions);
            let fetch_config = self.config.fetch.clone();
            let reconciler = Arc::clone(&reconciler);
            let scores = TournamentRepository::new(self.db.clone());
            tasks.spawn(async move {
                let _permit = permit;
                refresh_leaderboard(tournament, source, sessions, fetch_config, reconciler, scores)
                    .await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(unit) => stats.lock().await.absorb(unit),
                Err(err) => {
                    error!(error = %err, "Leaderboard task did not finish");
                    stats
                        .lock()
                        .await
                        .record_error(format!("leaderboard task failed: {err}"));
                }
            }
        }

        Ok(status_from(&*stats.lock().await))
    }

    /// Recompute tournament lifecycle states from the wall clock.
    async fn run_lifecycle_sweep(&self, stats: &SharedStats) -> Result<RunStatus, EngineError> {
        let automator = LifecycleAutomator::new(self.db.clone());
        let outcome = automator.sweep(Utc::now().fixed_offset()).await?;

        let mut shared = stats.lock().await;
        shared.seen += outcome.examined as u64;
        shared.updated += outcome.changes() as u64;
        Ok(RunStatus::Success)
    }
}

/// Terminal status from what a run's counters say: clean runs succeed, runs
/// that achieved nothing but errors fail, anything in between is partial.
fn status_from(stats: &RunStats) -> RunStatus {
    if stats.is_clean() {
        RunStatus::Success
    } else if stats.seen == 0 && stats.created == 0 && stats.updated == 0 {
        RunStatus::Failed
    } else {
        RunStatus::Partial
    }
}

/// One tournament's leaderboard refresh: fetch, reconcile each row to a
/// player, upsert the (tournament, player) score snapshot.
async fn refresh_leaderboard(
    tournament: tournament::Model,
    source: Arc<dyn Source>,
    sessions: Arc<SessionPool>,
    fetch_config: FetchConfig,
    reconciler: Arc<Reconciler>,
    scores: TournamentRepository,
) -> RunStats {
    let mut unit = RunStats::default();
    let params = FetchParams::for_tournament(&tournament.external_ref);

    let outcome = match fetch_with_retry(source.as_ref(), &sessions, &params, &fetch_config).await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(
                tournament = %tournament.name,
                error = %err,
                "Leaderboard fetch failed, skipping this tournament for the run"
            );
            unit.record_error(format!("{}: {err}", tournament.external_ref));
            return unit;
        }
    };

    unit.seen += outcome.records.len() as u64 + outcome.skipped;
    unit.skipped += outcome.skipped;

    for record in &outcome.records {
        let done = match reconciler.reconcile(record).await {
            Ok(done) => done,
            Err(err) => {
                warn!(player = %record.name, error = %err, "Failed to reconcile record");
                unit.record_error(format!("{}: {err}", record.name));
                continue;
            }
        };

        match scores
            .upsert_score(
                tournament.id,
                done.player.id,
                record.position,
                record.total_score,
                record.source,
                record.fetched_at.fixed_offset(),
            )
            .await
        {
            Ok(write) => {
                debug!(
                    tournament = %tournament.name,
                    player = %done.player.display_name,
                    ?write,
                    "Score row upserted"
                );
                match done.outcome {
                    ReconcileOutcome::Created => unit.created += 1,
                    ReconcileOutcome::Updated => unit.updated += 1,
                }
            }
            Err(err) => {
                warn!(
                    tournament = %tournament.name,
                    player = %done.player.display_name,
                    error = %err,
                    "Failed to upsert score row"
                );
                unit.record_error(format!("{}: {err}", done.player.display_name));
            }
        }
    }

    unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_claims_are_single_flight() {
        let guard = JobGuard::default();

        let permit = guard.try_claim();
        assert!(permit.is_some());
        assert!(guard.try_claim().is_none());

        drop(permit);
        assert!(guard.try_claim().is_some());
    }

    #[tokio::test]
    async fn guard_releases_when_a_run_panics() {
        let guard = JobGuard::default();
        let permit = guard.try_claim().expect("first claim");

        let handle = tokio::spawn(async move {
            let _permit = permit;
            panic!("run blew up");
        });
        assert!(handle.await.is_err());

        assert!(guard.try_claim().is_some(), "panic must release the slot");
    }

    #[test]
    fn status_reflects_counters() {
        let clean = RunStats {
            seen: 10,
            created: 2,
            updated: 8,
            ..RunStats::default()
        };
        assert_eq!(status_from(&clean), RunStatus::Success);

        let mut nothing = RunStats::default();
        nothing.record_error("fetch failed");
        assert_eq!(status_from(&nothing), RunStatus::Failed);

        let mut mixed = RunStats {
            seen: 10,
            created: 1,
            updated: 7,
            ..RunStats::default()
        };
        mixed.record_error("one bad row");
        assert_eq!(status_from(&mixed), RunStatus::Partial);

        let empty = RunStats::default();
        assert_eq!(status_from(&empty), RunStatus::Success);
    }
}
