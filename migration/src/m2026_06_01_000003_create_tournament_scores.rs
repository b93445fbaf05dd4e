//! Migration to create the tournament_scores table.
//!
//! One row per (tournament, player) pair, upserted by the live score job.
//! Position and total are nullable because leaderboard rows degrade (cut
//! players, unparsed markers) without losing the pairing itself.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TournamentScores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TournamentScores::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TournamentScores::TournamentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TournamentScores::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(TournamentScores::Position).integer().null())
                    .col(
                        ColumnDef::new(TournamentScores::TotalScore)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(TournamentScores::Source).text().not_null())
                    .col(
                        ColumnDef::new(TournamentScores::FetchedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TournamentScores::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TournamentScores::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tournament_scores_tournament_id")
                            .from(TournamentScores::Table, TournamentScores::TournamentId)
                            .to(Tournaments::Table, Tournaments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tournament_scores_player_id")
                            .from(TournamentScores::Table, TournamentScores::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique pairing so live refreshes upsert instead of accumulating rows
        manager
            .create_index(
                Index::create()
                    .name("idx_tournament_scores_pair")
                    .table(TournamentScores::Table)
                    .col(TournamentScores::TournamentId)
                    .col(TournamentScores::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index for leaderboard-ordered reads within a tournament
        manager
            .create_index(
                Index::create()
                    .name("idx_tournament_scores_position")
                    .table(TournamentScores::Table)
                    .col(TournamentScores::TournamentId)
                    .col(TournamentScores::Position)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tournament_scores_pair").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_tournament_scores_position")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(TournamentScores::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TournamentScores {
    Table,
    Id,
    TournamentId,
    PlayerId,
    Position,
    TotalScore,
    Source,
    FetchedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tournaments {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
}
