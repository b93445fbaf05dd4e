//! ScrapeRun entity model
//!
//! Append-only record of one scrape or sweep execution: what ran, when, how
//! it ended, and how many records it saw, created, updated, skipped, and
//! errored. Written best-effort by the run log sink.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// ScrapeRun entity representing one finished run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scrape_runs")]
pub struct Model {
    /// Unique identifier for the run (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Job kind that ran (ranking_refresh, live_scores, lifecycle_sweep)
    pub job_kind: String,

    /// Terminal status (success, partial, failed)
    pub status: String,

    /// Timestamp when the run started
    pub started_at: DateTimeWithTimeZone,

    /// Timestamp when the run finished
    pub finished_at: DateTimeWithTimeZone,

    /// Number of source records seen
    pub records_seen: i64,

    /// Number of canonical rows created
    pub records_created: i64,

    /// Number of canonical rows updated
    pub records_updated: i64,

    /// Number of records dropped by validation or merge
    pub records_skipped: i64,

    /// Number of records that failed with an error
    pub records_errored: i64,

    /// Capped list of error summaries, if any
    #[sea_orm(column_type = "JsonBinary")]
    pub errors: Option<JsonValue>,

    /// Timestamp when the run row was written
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
