//! Migration to create the players table.
//!
//! This migration creates the players table, the canonical store of golfers
//! reconciled from the ranking and leaderboard sources. Identity is the
//! normalized name key; display fields keep whatever the last authoritative
//! source reported.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::NameKey).text().not_null())
                    .col(ColumnDef::new(Players::DisplayName).text().not_null())
                    .col(ColumnDef::new(Players::CountryCode).text().null())
                    .col(
                        ColumnDef::new(Players::WorldRank)
                            .integer()
                            .not_null()
                            .default(999),
                    )
                    .col(
                        ColumnDef::new(Players::RankingPoints)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Players::EventsPlayed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Players::Source).text().not_null())
                    .col(
                        ColumnDef::new(Players::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Players::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Players::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index enforcing one canonical row per normalized name key
        manager
            .create_index(
                Index::create()
                    .name("idx_players_name_key")
                    .table(Players::Table)
                    .col(Players::NameKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index for rank-ordered reads
        manager
            .create_index(
                Index::create()
                    .name("idx_players_world_rank")
                    .table(Players::Table)
                    .col(Players::WorldRank)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_players_name_key").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_players_world_rank").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    NameKey,
    DisplayName,
    CountryCode,
    WorldRank,
    RankingPoints,
    EventsPlayed,
    Source,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}
