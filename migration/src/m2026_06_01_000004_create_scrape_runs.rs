//! Migration to create the scrape_runs table.
//!
//! Append-only log of scrape and sweep executions: one row per run with
//! outcome counters and capped error summaries. Written best-effort by the
//! run log sink, read by the status surface.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeRuns::JobKind).text().not_null())
                    .col(ColumnDef::new(ScrapeRuns::Status).text().not_null())
                    .col(
                        ColumnDef::new(ScrapeRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapeRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapeRuns::RecordsSeen)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeRuns::RecordsCreated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeRuns::RecordsUpdated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeRuns::RecordsSkipped)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeRuns::RecordsErrored)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScrapeRuns::Errors).json_binary().null())
                    .col(
                        ColumnDef::new(ScrapeRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for last-run-per-kind queries with started_at DESC using raw SQL
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_scrape_runs_kind_started ON scrape_runs (job_kind, started_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_scrape_runs_kind_started").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ScrapeRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeRuns {
    Table,
    Id,
    JobKind,
    Status,
    StartedAt,
    FinishedAt,
    RecordsSeen,
    RecordsCreated,
    RecordsUpdated,
    RecordsSkipped,
    RecordsErrored,
    Errors,
    CreatedAt,
}
