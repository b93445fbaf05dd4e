//! # Player Repository
//!
//! Repository operations for the players table. All reconciliation writes
//! land here, one row per canonical player.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::models::player::{ActiveModel, Column, Entity, Model};

/// Repository for player database operations
pub struct PlayerRepository {
    db: DatabaseConnection,
}

impl PlayerRepository {
    /// Create a new PlayerRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find a player by normalized identity key
    pub async fn find_by_key(&self, name_key: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::NameKey.eq(name_key))
            .one(&self.db)
            .await
    }

    /// Find a player by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(&self.db).await
    }

    /// All (id, identity key) pairs, for fuzzy candidate scoring.
    pub async fn candidate_keys(&self) -> Result<Vec<(Uuid, String)>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::Id)
            .column(Column::NameKey)
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await
    }

    /// Insert a new player row. Unique-key violations bubble up so callers
    /// can fall back to the merge path.
    pub async fn insert(&self, player: ActiveModel) -> Result<Model, DbErr> {
        player.insert(&self.db).await
    }

    /// Apply an already-merged set of fields to an existing row
    pub async fn update(&self, player: ActiveModel) -> Result<Model, DbErr> {
        player.update(&self.db).await
    }

    /// Players ordered by world rank, unranked rows last by key
    pub async fn list_by_rank(&self, limit: u64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_asc(Column::WorldRank)
            .order_by_asc(Column::NameKey)
            .limit(limit)
            .all(&self.db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database, Set};

    use super::*;
    use crate::models::player;

    async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options)
            .await
            .expect("Failed to connect to test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
    }

    fn test_player(name_key: &str, display_name: &str, world_rank: i32) -> ActiveModel {
        let now = Utc::now().fixed_offset();
        ActiveModel {
            id: Set(Uuid::new_v4()),
            name_key: Set(name_key.to_string()),
            display_name: Set(display_name.to_string()),
            country_code: Set(None),
            world_rank: Set(world_rank),
            ranking_points: Set(0.0),
            events_played: Set(0),
            source: Set("world_rankings".to_string()),
            last_synced_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    #[tokio::test]
    async fn find_by_key_returns_inserted_player() {
        let db = setup_test_db().await;
        let repo = PlayerRepository::new(db);

        repo.insert(test_player("jon rahm", "Jon Rahm", 2))
            .await
            .unwrap();

        let found = repo.find_by_key("jon rahm").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().display_name, "Jon Rahm");

        let missing = repo.find_by_key("nobody here").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_key_insert_is_rejected() {
        let db = setup_test_db().await;
        let repo = PlayerRepository::new(db);

        repo.insert(test_player("jon rahm", "Jon Rahm", 2))
            .await
            .unwrap();
        let err = repo
            .insert(test_player("jon rahm", "JON RAHM", 5))
            .await
            .unwrap_err();

        assert!(crate::error::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn candidate_keys_cover_all_rows() {
        let db = setup_test_db().await;
        let repo = PlayerRepository::new(db);

        repo.insert(test_player("jon rahm", "Jon Rahm", 2))
            .await
            .unwrap();
        repo.insert(test_player("rory mcilroy", "Rory McIlroy", 3))
            .await
            .unwrap();

        let mut keys: Vec<String> = repo
            .candidate_keys()
            .await
            .unwrap()
            .into_iter()
            .map(|(_, key)| key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["jon rahm", "rory mcilroy"]);
    }

    #[tokio::test]
    async fn list_by_rank_orders_ranked_players_first() {
        let db = setup_test_db().await;
        let repo = PlayerRepository::new(db);

        repo.insert(test_player("amateur alpha", "Amateur Alpha", player::UNRANKED))
            .await
            .unwrap();
        repo.insert(test_player("jon rahm", "Jon Rahm", 2))
            .await
            .unwrap();
        repo.insert(test_player("rory mcilroy", "Rory McIlroy", 3))
            .await
            .unwrap();

        let ranked = repo.list_by_rank(10).await.unwrap();
        let names: Vec<&str> = ranked.iter().map(|p| p.name_key.as_str()).collect();
        assert_eq!(names, vec!["jon rahm", "rory mcilroy", "amateur alpha"]);

        // Sentinel rows sort behind every real rank
        assert!(ranked[0].is_ranked());
        assert!(ranked[1].is_ranked());
        assert!(!ranked[2].is_ranked());
    }
}
