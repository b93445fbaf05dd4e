//! Player entity model
//!
//! This module contains the SeaORM entity model for the players table, the
//! canonical store of golfers reconciled from the ranking and leaderboard
//! sources. The normalized name key is the identity; everything else is
//! display data owned by whichever source last wrote it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// World rank value stored when no source has reported a real rank.
pub const UNRANKED: i32 = 999;

/// Player entity representing one canonical golfer
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "players")]
pub struct Model {
    /// Unique identifier for the player (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Normalized name key used for identity matching (unique)
    pub name_key: String,

    /// Display name as last reported by a source
    pub display_name: String,

    /// Country code (2-3 letters), absent until a source reports one
    pub country_code: Option<String>,

    /// Current world rank, or the unranked sentinel 999
    pub world_rank: i32,

    /// Accumulated world ranking points
    pub ranking_points: f64,

    /// Number of counted events in the ranking window
    pub events_played: i32,

    /// Identifier of the source that last wrote this row
    pub source: String,

    /// Timestamp of the last reconciliation that touched this row
    pub last_synced_at: DateTimeWithTimeZone,

    /// Timestamp when the player was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the player was last updated
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

impl Model {
    /// Whether this player currently carries a real world rank.
    pub fn is_ranked(&self) -> bool {
        self.world_rank != UNRANKED
    }
}
