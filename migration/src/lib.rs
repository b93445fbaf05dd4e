//! Database migrations for the caddie scraping service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_06_01_000001_create_players;
mod m2026_06_01_000002_create_tournaments;
mod m2026_06_01_000003_create_tournament_scores;
mod m2026_06_01_000004_create_scrape_runs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_06_01_000001_create_players::Migration),
            Box::new(m2026_06_01_000002_create_tournaments::Migration),
            Box::new(m2026_06_01_000003_create_tournament_scores::Migration),
            Box::new(m2026_06_01_000004_create_scrape_runs::Migration),
        ]
    }
}
