//! Test utilities for engine and source integration tests.
//!
//! Provides an in-memory SQLite database with migrations applied, a
//! configuration preset pointed at mock sources, and a poll helper for the
//! fire-and-forget run records.

use anyhow::Result;
use caddie::config::{AppConfig, FetchConfig, MatcherConfig, SchedulerConfig};
use caddie::models::scrape_run;
use caddie::run_log::JobKind;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use std::time::Duration;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is pinned to a single connection because every pooled
/// connection to `sqlite::memory:` would otherwise get its own database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Builds a configuration pointed at mock source servers, with backoff and
/// intervals shrunk so tests finish quickly.
#[allow(dead_code)]
pub fn test_config(rankings_url: &str, leaderboard_url: &str) -> AppConfig {
    AppConfig {
        fetch: FetchConfig {
            rankings_base_url: rankings_url.to_string(),
            leaderboard_base_url: leaderboard_url.to_string(),
            timeout_ms: 5_000,
            max_retries: 2,
            retry_backoff_ms: 25,
            ..FetchConfig::default()
        },
        scheduler: SchedulerConfig {
            ranking_run_timeout_seconds: 30,
            live_run_timeout_seconds: 30,
            sweep_run_timeout_seconds: 30,
            ..SchedulerConfig::default()
        },
        matcher: MatcherConfig::default(),
        ..AppConfig::default()
    }
}

/// Waits until `expected` run records exist for the given job kind and
/// returns the most recent one. Panics when the runs do not land within a
/// few seconds.
#[allow(dead_code)]
pub async fn wait_for_runs(
    db: &DatabaseConnection,
    kind: JobKind,
    expected: u64,
) -> scrape_run::Model {
    for _ in 0..200 {
        let recorded = scrape_run::Entity::find()
            .filter(scrape_run::Column::JobKind.eq(kind.as_str()))
            .count(db)
            .await
            .expect("count run records");
        if recorded >= expected {
            return scrape_run::Entity::find()
                .filter(scrape_run::Column::JobKind.eq(kind.as_str()))
                .order_by_desc(scrape_run::Column::StartedAt)
                .one(db)
                .await
                .expect("load run record")
                .expect("run record present");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("run record for {kind} did not appear in time");
}

/// Number of run records written for a job kind.
#[allow(dead_code)]
pub async fn run_count(db: &DatabaseConnection, kind: JobKind) -> u64 {
    scrape_run::Entity::find()
        .filter(scrape_run::Column::JobKind.eq(kind.as_str()))
        .count(db)
        .await
        .expect("count run records")
}
