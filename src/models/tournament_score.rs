//! TournamentScore entity model
//!
//! One row per (tournament, player) pair, upserted on every live leaderboard
//! refresh. Position and total score are nullable so unparsed leaderboard
//! markers degrade without dropping the pairing.

use super::player::Entity as Player;
use super::tournament::Entity as Tournament;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// TournamentScore entity linking a player to a tournament leaderboard row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tournament_scores")]
pub struct Model {
    /// Unique identifier for the score row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tournament this score belongs to
    pub tournament_id: Uuid,

    /// Player this score belongs to
    pub player_id: Uuid,

    /// Leaderboard position (ties share a position), absent when unparsed
    pub position: Option<i32>,

    /// Total score relative to par, absent when unparsed
    pub total_score: Option<i32>,

    /// Identifier of the source that last wrote this row
    pub source: String,

    /// Timestamp of the fetch that produced this row's values
    pub fetched_at: DateTimeWithTimeZone,

    /// Timestamp when the score row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the score row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Tournament",
        from = "Column::TournamentId",
        to = "super::tournament::Column::Id"
    )]
    Tournament,

    #[sea_orm(
        belongs_to = "Player",
        from = "Column::PlayerId",
        to = "super::player::Column::Id"
    )]
    Player,
}

impl Related<Tournament> for Entity {
    fn to() -> RelationDef {
        Relation::Tournament.def()
    }
}

impl Related<Player> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
