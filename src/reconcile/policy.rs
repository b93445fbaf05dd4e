//! Conflict resolution policy
//!
//! Pure field-merge rules applied once a record has been matched to a player.
//! Sources report different subsets of fields with different authority, so
//! the rules never let a sparse record blank out a known value.

use crate::models::player;
use crate::sources::RawRecord;

/// The canonical fields a merge or seed decides.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedFields {
    pub display_name: String,
    pub country_code: Option<String>,
    pub world_rank: i32,
    pub ranking_points: f64,
    pub events_played: i32,
}

/// Merge an incoming record into an existing player, field by field.
pub fn merge(existing: &player::Model, incoming: &RawRecord) -> MergedFields {
    MergedFields {
        display_name: merge_display_name(&existing.display_name, &incoming.name),
        country_code: merge_country(
            existing.country_code.as_deref(),
            incoming.country.as_deref(),
        ),
        world_rank: merge_rank(existing.world_rank, incoming.rank),
        ranking_points: merge_points(existing.ranking_points, incoming.points),
        events_played: merge_events(existing.events_played, incoming.events_played),
    }
}

/// Starting fields for a newly discovered player.
pub fn seed(incoming: &RawRecord) -> MergedFields {
    MergedFields {
        display_name: incoming.name.trim().to_string(),
        country_code: incoming.country.clone(),
        world_rank: incoming.rank.unwrap_or(player::UNRANKED),
        ranking_points: incoming.points.unwrap_or(0.0),
        events_played: incoming.events_played.unwrap_or(0),
    }
}

/// An incoming real rank is authoritative for its source. A missing rank or
/// the unranked sentinel never overwrites a known rank.
fn merge_rank(existing: i32, incoming: Option<i32>) -> i32 {
    match incoming {
        Some(rank) if rank != player::UNRANKED => rank,
        _ => existing,
    }
}

/// Country only ever fills a gap, it is never corrected by a source.
fn merge_country(existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    match existing {
        Some(code) if !code.is_empty() => Some(code.to_string()),
        _ => incoming.map(str::to_string),
    }
}

fn merge_points(existing: f64, incoming: Option<f64>) -> f64 {
    match incoming {
        Some(points) if points != 0.0 => points,
        _ => existing,
    }
}

fn merge_events(existing: i32, incoming: Option<i32>) -> i32 {
    match incoming {
        Some(events) if events != 0 => events,
        _ => existing,
    }
}

/// The freshest non-empty spelling wins, so an upstream casing fix
/// eventually heals stored names.
fn merge_display_name(existing: &str, incoming: &str) -> String {
    let trimmed = incoming.trim();
    if trimmed.is_empty() {
        existing.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::sources::world_rankings::WORLD_RANKINGS;

    fn existing_player(world_rank: i32, country_code: Option<&str>) -> player::Model {
        let now = Utc::now().fixed_offset();
        player::Model {
            id: Uuid::new_v4(),
            name_key: "rory mcilroy".to_string(),
            display_name: "Rory McIlroy".to_string(),
            country_code: country_code.map(str::to_string),
            world_rank,
            ranking_points: 312.5,
            events_played: 44,
            source: WORLD_RANKINGS.to_string(),
            last_synced_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn seed_fills_sentinel_and_zero_defaults() {
        let mut record = RawRecord::named(WORLD_RANKINGS, "Jon Rahm");
        record.country = Some("ESP".to_string());
        record.rank = Some(2);

        let fields = seed(&record);
        assert_eq!(fields.display_name, "Jon Rahm");
        assert_eq!(fields.country_code.as_deref(), Some("ESP"));
        assert_eq!(fields.world_rank, 2);
        assert_eq!(fields.ranking_points, 0.0);
        assert_eq!(fields.events_played, 0);

        let sparse = seed(&RawRecord::named(WORLD_RANKINGS, "Mystery Qualifier"));
        assert_eq!(sparse.world_rank, player::UNRANKED);
        assert_eq!(sparse.country_code, None);
    }

    #[test]
    fn sentinel_rank_never_overwrites_a_known_rank() {
        let existing = existing_player(3, None);
        let mut record = RawRecord::named(WORLD_RANKINGS, "Rory McIlroy");
        record.rank = Some(player::UNRANKED);
        record.country = Some("NIR".to_string());

        let merged = merge(&existing, &record);
        assert_eq!(merged.world_rank, 3);
        assert_eq!(merged.country_code.as_deref(), Some("NIR"));
    }

    #[test]
    fn a_real_incoming_rank_is_authoritative_even_when_worse() {
        let existing = existing_player(3, Some("NIR"));
        let mut record = RawRecord::named(WORLD_RANKINGS, "Rory McIlroy");
        record.rank = Some(12);

        assert_eq!(merge(&existing, &record).world_rank, 12);
    }

    #[test]
    fn country_fills_a_gap_but_is_never_corrected() {
        let existing = existing_player(3, Some("NIR"));
        let mut record = RawRecord::named(WORLD_RANKINGS, "Rory McIlroy");
        record.country = Some("IRL".to_string());

        assert_eq!(merge(&existing, &record).country_code.as_deref(), Some("NIR"));
    }

    #[test]
    fn sparse_record_keeps_every_existing_field() {
        let existing = existing_player(3, Some("NIR"));
        let record = RawRecord::named(WORLD_RANKINGS, "Rory McIlroy");

        let merged = merge(&existing, &record);
        assert_eq!(merged.world_rank, 3);
        assert_eq!(merged.country_code.as_deref(), Some("NIR"));
        assert_eq!(merged.ranking_points, 312.5);
        assert_eq!(merged.events_played, 44);
    }

    #[test]
    fn nonzero_counters_replace_zero_counters_do_not() {
        let existing = existing_player(3, None);
        let mut record = RawRecord::named(WORLD_RANKINGS, "Rory McIlroy");
        record.points = Some(290.0);
        record.events_played = Some(0);

        let merged = merge(&existing, &record);
        assert_eq!(merged.ranking_points, 290.0);
        assert_eq!(merged.events_played, 44);
    }

    #[test]
    fn merge_is_deterministic_for_a_fixed_pair() {
        let existing = existing_player(3, None);
        let mut record = RawRecord::named(WORLD_RANKINGS, "Rory McIlroy");
        record.rank = Some(4);
        record.points = Some(301.0);

        assert_eq!(merge(&existing, &record), merge(&existing, &record));
    }
}
