//! # Service Bootstrap
//!
//! Wires configuration, the database pool, the scrape engine, and the
//! scheduler into a running service with signal-driven shutdown.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::db::{health_check, init_pool};
use crate::engine::ScrapeEngine;
use crate::logging::init_tracing;
use crate::scheduler::ScrapeScheduler;
use migration::{Migrator, MigratorTrait};

/// Starts the scraping service with the given configuration.
///
/// Blocks until Ctrl+C, then cancels the scheduler loop and shuts the
/// fetch session pool before returning.
pub async fn run_service(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&config)?;

    let db = init_pool(&config).await?;
    health_check(&db).await?;
    Migrator::up(&db, None).await?;

    println!("Running in profile: {}", config.profile);

    let engine = Arc::new(ScrapeEngine::new(db, config.clone()));
    let scheduler = ScrapeScheduler::new(engine.clone(), config.scheduler.clone());

    let shutdown = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, initiating shutdown");
    shutdown.cancel();

    let _ = scheduler_handle.await;
    engine.shutdown().await;

    Ok(())
}
