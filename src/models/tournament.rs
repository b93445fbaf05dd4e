//! Tournament entity model
//!
//! This module contains the SeaORM entity model for the tournaments table.
//! The status column is derived from the scheduled window by the lifecycle
//! sweep and only ever moves forward (upcoming, active, completed).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Tournament entity representing one scheduled competition
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tournaments")]
pub struct Model {
    /// Unique identifier for the tournament (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable tournament name
    pub name: String,

    /// Key the leaderboard source is queried with (unique)
    pub external_ref: String,

    /// Scheduled start of play
    pub starts_at: DateTimeWithTimeZone,

    /// Scheduled end of play
    pub ends_at: DateTimeWithTimeZone,

    /// Lifecycle status (upcoming, active, completed)
    pub status: String,

    /// Timestamp when the tournament was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the tournament was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tournament_score::Entity")]
    TournamentScore,
}

impl Related<super::tournament_score::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TournamentScore.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
