//! Entity reconciliation
//!
//! Matches each raw record to a canonical player, by exact identity key
//! first and a fuzzy fallback second, or creates a new player when nothing
//! matches confidently. An ambiguous fuzzy match creates a new player rather
//! than silently merging two people; duplicates are cheaper to clean up than
//! a silent merge is to untangle.

pub mod normalize;
pub mod policy;
pub mod similarity;

pub use normalize::name_key;
pub use similarity::{JaroWinklerSimilarity, NameSimilarity};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::{DatabaseConnection, Set};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MatcherConfig;
use crate::error::is_unique_violation;
use crate::models::player;
use crate::repositories::PlayerRepository;
use crate::sources::RawRecord;

/// Error from reconciling a single record
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("record name '{0}' normalizes to an empty identity key")]
    UnusableName(String),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

/// How a record landed in the canonical store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
}

/// A reconciled record: the player row it ended up on and how.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub player: player::Model,
    pub outcome: ReconcileOutcome,
}

/// Reconciles raw records into the players table.
///
/// One instance lives for one run. Writes for the same identity key are
/// serialized through run-local per-key locks, so two records resolving to
/// the same new player cannot create two rows.
pub struct Reconciler {
    players: PlayerRepository,
    similarity: Arc<dyn NameSimilarity>,
    accept_threshold: f64,
    ambiguity_margin: f64,
    creation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Reconciler {
    /// Create a reconciler with the default similarity function
    pub fn new(db: DatabaseConnection, matcher: &MatcherConfig) -> Self {
        Self::with_similarity(db, matcher, Arc::new(JaroWinklerSimilarity))
    }

    /// Create a reconciler with a custom similarity function
    pub fn with_similarity(
        db: DatabaseConnection,
        matcher: &MatcherConfig,
        similarity: Arc<dyn NameSimilarity>,
    ) -> Self {
        Self {
            players: PlayerRepository::new(db),
            similarity,
            accept_threshold: matcher.accept_threshold,
            ambiguity_margin: matcher.ambiguity_margin,
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile one record into the canonical store.
    pub async fn reconcile(&self, record: &RawRecord) -> Result<Reconciled, ReconcileError> {
        let key = name_key(&record.name);
        if key.is_empty() {
            return Err(ReconcileError::UnusableName(record.name.clone()));
        }

        let lock = self.creation_lock(&key).await;
        let _guard = lock.lock().await;

        if let Some(existing) = self.players.find_by_key(&key).await? {
            let updated = self.apply_merge(existing, record).await?;
            return Ok(Reconciled {
                player: updated,
                outcome: ReconcileOutcome::Updated,
            });
        }

        if let Some(existing) = self.fuzzy_match(&key).await? {
            counter!("reconcile_fuzzy_matches_total").increment(1);
            let updated = self.apply_merge(existing, record).await?;
            return Ok(Reconciled {
                player: updated,
                outcome: ReconcileOutcome::Updated,
            });
        }

        self.create(&key, record).await
    }

    /// Best fuzzy candidate for `key`, or `None` when nothing clears the
    /// acceptance threshold with enough distance to the runner-up.
    async fn fuzzy_match(&self, key: &str) -> Result<Option<player::Model>, ReconcileError> {
        let candidates = self.players.candidate_keys().await?;

        let mut best: Option<Uuid> = None;
        let mut best_score = 0.0_f64;
        let mut runner_up = 0.0_f64;
        for (id, candidate_key) in candidates {
            let score = self.similarity.score(key, &candidate_key);
            if score > best_score {
                runner_up = best_score;
                best = Some(id);
                best_score = score;
            } else if score > runner_up {
                runner_up = score;
            }
        }

        let Some(best_id) = best else {
            return Ok(None);
        };
        if best_score < self.accept_threshold {
            return Ok(None);
        }
        if best_score - runner_up < self.ambiguity_margin {
            warn!(
                key,
                best_score,
                runner_up,
                "Ambiguous fuzzy match, creating a new player instead of merging"
            );
            counter!("reconcile_ambiguous_total").increment(1);
            return Ok(None);
        }

        debug!(key, best_score, "Fuzzy-matched record to existing player");
        Ok(self.players.find_by_id(best_id).await?)
    }

    async fn apply_merge(
        &self,
        existing: player::Model,
        record: &RawRecord,
    ) -> Result<player::Model, ReconcileError> {
        let merged = policy::merge(&existing, record);
        let mut active: player::ActiveModel = existing.into();
        active.display_name = Set(merged.display_name);
        active.country_code = Set(merged.country_code);
        active.world_rank = Set(merged.world_rank);
        active.ranking_points = Set(merged.ranking_points);
        active.events_played = Set(merged.events_played);
        active.source = Set(record.source.to_string());
        active.last_synced_at = Set(record.fetched_at.fixed_offset());
        active.updated_at = Set(Utc::now().fixed_offset());
        Ok(self.players.update(active).await?)
    }

    async fn create(&self, key: &str, record: &RawRecord) -> Result<Reconciled, ReconcileError> {
        let fields = policy::seed(record);
        let now = Utc::now().fixed_offset();
        let row = player::ActiveModel {
            id: Set(Uuid::new_v4()),
            name_key: Set(key.to_string()),
            display_name: Set(fields.display_name),
            country_code: Set(fields.country_code),
            world_rank: Set(fields.world_rank),
            ranking_points: Set(fields.ranking_points),
            events_played: Set(fields.events_played),
            source: Set(record.source.to_string()),
            last_synced_at: Set(record.fetched_at.fixed_offset()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match self.players.insert(row).await {
            Ok(created) => {
                debug!(key, "Created new player");
                counter!("reconcile_created_total").increment(1);
                Ok(Reconciled {
                    player: created,
                    outcome: ReconcileOutcome::Created,
                })
            }
            // A writer outside this run's locks beat us to the key.
            Err(err) if is_unique_violation(&err) => {
                let existing = self.players.find_by_key(key).await?.ok_or(err)?;
                let updated = self.apply_merge(existing, record).await?;
                Ok(Reconciled {
                    player: updated,
                    outcome: ReconcileOutcome::Updated,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn creation_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.creation_locks.lock().await;
        locks.entry(key.to_string()).or_default().clone()
    }
}
