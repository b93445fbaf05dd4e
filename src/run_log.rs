//! Run log sink
//!
//! Append-only per-run bookkeeping for the status surface. Writing a run
//! record is best-effort: a failed write is logged and swallowed, it never
//! fails the run it describes.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::models::scrape_run;

/// Most error summaries kept on a single run record.
const MAX_ERROR_SUMMARIES: usize = 20;

/// The scheduled job kinds the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    RankingRefresh,
    LiveScores,
    LifecycleSweep,
}

impl JobKind {
    /// Return the canonical string representation for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            JobKind::RankingRefresh => "ranking_refresh",
            JobKind::LiveScores => "live_scores",
            JobKind::LifecycleSweep => "lifecycle_sweep",
        }
    }

    /// Parse a stored kind string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ranking_refresh" => Some(JobKind::RankingRefresh),
            "live_scores" => Some(JobKind::LiveScores),
            "lifecycle_sweep" => Some(JobKind::LifecycleSweep),
            _ => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    /// Return the canonical string representation for this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }

    /// Parse a stored status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(RunStatus::Success),
            "partial" => Some(RunStatus::Partial),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters and capped error summaries accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub seen: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errored: u64,
    pub errors: Vec<String>,
}

impl RunStats {
    /// Count one errored record or unit of work, keeping a bounded summary.
    pub fn record_error(&mut self, summary: impl Into<String>) {
        self.errored += 1;
        if self.errors.len() < MAX_ERROR_SUMMARIES {
            self.errors.push(summary.into());
        } else if self.errors.len() == MAX_ERROR_SUMMARIES {
            self.errors.push("further errors omitted".to_string());
        }
    }

    /// Fold stats from a concurrently-processed unit into this run's totals.
    pub fn absorb(&mut self, other: RunStats) {
        self.seen += other.seen;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errored += other.errored;
        for summary in other.errors {
            if self.errors.len() < MAX_ERROR_SUMMARIES {
                self.errors.push(summary);
            } else if self.errors.len() == MAX_ERROR_SUMMARIES {
                self.errors.push("further errors omitted".to_string());
                break;
            }
        }
    }

    /// True when nothing went wrong anywhere in the run
    pub fn is_clean(&self) -> bool {
        self.errored == 0 && self.errors.is_empty()
    }
}

/// Appends run records and serves the status surface's reads.
pub struct RunLogSink {
    db: DatabaseConnection,
}

impl RunLogSink {
    /// Create a new sink over the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one run record. Best-effort: a write failure is logged and
    /// swallowed so observability never sits on the critical path.
    pub async fn record(
        &self,
        kind: JobKind,
        status: RunStatus,
        started_at: DateTime<FixedOffset>,
        finished_at: DateTime<FixedOffset>,
        stats: &RunStats,
    ) {
        let errors = if stats.errors.is_empty() {
            None
        } else {
            Some(json!(stats.errors))
        };
        let row = scrape_run::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_kind: Set(kind.as_str().to_string()),
            status: Set(status.as_str().to_string()),
            started_at: Set(started_at),
            finished_at: Set(finished_at),
            records_seen: Set(stats.seen as i64),
            records_created: Set(stats.created as i64),
            records_updated: Set(stats.updated as i64),
            records_skipped: Set(stats.skipped as i64),
            records_errored: Set(stats.errored as i64),
            errors: Set(errors),
            created_at: Set(Utc::now().fixed_offset()),
        };

        if let Err(err) = row.insert(&self.db).await {
            warn!(kind = %kind, error = %err, "Failed to write run record");
            counter!("run_log_write_failures_total").increment(1);
        }
    }

    /// Most recent run record for a job kind
    pub async fn last_run(&self, kind: JobKind) -> Result<Option<scrape_run::Model>, DbErr> {
        scrape_run::Entity::find()
            .filter(scrape_run::Column::JobKind.eq(kind.as_str()))
            .order_by_desc(scrape_run::Column::StartedAt)
            .one(&self.db)
            .await
    }
}
