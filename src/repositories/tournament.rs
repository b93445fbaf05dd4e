//! # Tournament Repository
//!
//! Repository operations for the tournaments and tournament_scores tables.
//! Scores are upserted per (tournament, player) pair and never duplicated.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::lifecycle::TournamentStatus;
use crate::models::tournament::{ActiveModel, Column, Entity, Model};
use crate::models::tournament_score;

/// How an upserted score row landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreWrite {
    Created,
    Updated,
}

/// Repository for tournament database operations
pub struct TournamentRepository {
    db: DatabaseConnection,
}

impl TournamentRepository {
    /// Create a new TournamentRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a tournament in the upcoming state
    pub async fn create(
        &self,
        name: &str,
        external_ref: &str,
        starts_at: DateTime<FixedOffset>,
        ends_at: DateTime<FixedOffset>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now().fixed_offset();
        let tournament = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            external_ref: Set(external_ref.to_string()),
            starts_at: Set(starts_at),
            ends_at: Set(ends_at),
            status: Set(TournamentStatus::Upcoming.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        tournament.insert(&self.db).await
    }

    /// Find a tournament by its external leaderboard reference
    pub async fn find_by_external_ref(&self, external_ref: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExternalRef.eq(external_ref))
            .one(&self.db)
            .await
    }

    /// Tournaments currently in play, soonest start first
    pub async fn list_active(&self) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Status.eq(TournamentStatus::Active.as_str()))
            .order_by_asc(Column::StartsAt)
            .all(&self.db)
            .await
    }

    /// Tournaments the lifecycle sweep still has to look at
    pub async fn list_unfinished(&self) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Status.ne(TournamentStatus::Completed.as_str()))
            .order_by_asc(Column::StartsAt)
            .all(&self.db)
            .await
    }

    /// Move a tournament to a new lifecycle status
    pub async fn set_status(
        &self,
        tournament: Model,
        status: TournamentStatus,
        now: DateTime<FixedOffset>,
    ) -> Result<Model, DbErr> {
        let mut active: ActiveModel = tournament.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(now);
        active.update(&self.db).await
    }

    /// Upsert the score row for one (tournament, player) pair.
    ///
    /// Scores are a live snapshot, so the incoming position and total replace
    /// whatever was stored, including replacing a value with none when the
    /// player drops off the board.
    pub async fn upsert_score(
        &self,
        tournament_id: Uuid,
        player_id: Uuid,
        position: Option<i32>,
        total_score: Option<i32>,
        source: &str,
        fetched_at: DateTime<FixedOffset>,
    ) -> Result<ScoreWrite, DbErr> {
        if let Some(existing) = self.find_score(tournament_id, player_id).await? {
            self.update_score(existing, position, total_score, source, fetched_at)
                .await?;
            return Ok(ScoreWrite::Updated);
        }

        let now = Utc::now().fixed_offset();
        let score = tournament_score::ActiveModel {
            id: Set(Uuid::new_v4()),
            tournament_id: Set(tournament_id),
            player_id: Set(player_id),
            position: Set(position),
            total_score: Set(total_score),
            source: Set(source.to_string()),
            fetched_at: Set(fetched_at),
            created_at: Set(now),
            updated_at: Set(now),
        };
        match score.insert(&self.db).await {
            Ok(_) => Ok(ScoreWrite::Created),
            // Lost an insert race for the same pair, fall back to updating.
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_score(tournament_id, player_id)
                    .await?
                    .ok_or_else(|| {
                        DbErr::RecordNotFound(format!(
                            "score row for tournament {tournament_id} vanished after conflict"
                        ))
                    })?;
                self.update_score(existing, position, total_score, source, fetched_at)
                    .await?;
                Ok(ScoreWrite::Updated)
            }
            Err(err) => Err(err),
        }
    }

    /// Score rows for a tournament, best position first
    pub async fn scores_for(
        &self,
        tournament_id: Uuid,
    ) -> Result<Vec<tournament_score::Model>, DbErr> {
        tournament_score::Entity::find()
            .filter(tournament_score::Column::TournamentId.eq(tournament_id))
            .order_by_asc(tournament_score::Column::Position)
            .all(&self.db)
            .await
    }

    async fn find_score(
        &self,
        tournament_id: Uuid,
        player_id: Uuid,
    ) -> Result<Option<tournament_score::Model>, DbErr> {
        tournament_score::Entity::find()
            .filter(tournament_score::Column::TournamentId.eq(tournament_id))
            .filter(tournament_score::Column::PlayerId.eq(player_id))
            .one(&self.db)
            .await
    }

    async fn update_score(
        &self,
        existing: tournament_score::Model,
        position: Option<i32>,
        total_score: Option<i32>,
        source: &str,
        fetched_at: DateTime<FixedOffset>,
    ) -> Result<tournament_score::Model, DbErr> {
        let mut active: tournament_score::ActiveModel = existing.into();
        active.position = Set(position);
        active.total_score = Set(total_score);
        active.source = Set(source.to_string());
        active.fetched_at = Set(fetched_at);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&self.db).await
    }
}
