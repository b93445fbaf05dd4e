//! Migration to create the tournaments table.
//!
//! Tournaments carry a scheduled window and a lifecycle status driven from
//! that window (upcoming, active, completed). The external ref is the key the
//! leaderboard source is queried with.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tournaments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tournaments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tournaments::Name).text().not_null())
                    .col(ColumnDef::new(Tournaments::ExternalRef).text().not_null())
                    .col(
                        ColumnDef::new(Tournaments::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tournaments::EndsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tournaments::Status)
                            .text()
                            .not_null()
                            .default("upcoming"),
                    )
                    .col(
                        ColumnDef::new(Tournaments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tournaments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tournaments_external_ref")
                    .table(Tournaments::Table)
                    .col(Tournaments::ExternalRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index for the lifecycle sweep and active-tournament reads
        manager
            .create_index(
                Index::create()
                    .name("idx_tournaments_status")
                    .table(Tournaments::Table)
                    .col(Tournaments::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tournaments_external_ref").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_tournaments_status").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tournaments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tournaments {
    Table,
    Id,
    Name,
    ExternalRef,
    StartsAt,
    EndsAt,
    Status,
    CreatedAt,
    UpdatedAt,
}
