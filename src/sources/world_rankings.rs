//! World ranking source.
//!
//! Fetches the full ranking table as a JSON row array and maps it to raw
//! records. Rows with implausible names are dropped and counted as skipped,
//! never turned into errors, so one junk row cannot sink the refresh.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::trait_::{
    FetchError, FetchOutcome, FetchParams, RawRecord, Source, classify_reqwest, classify_status,
};
use super::validate::{check_name, normalize_country};
use crate::session::Session;

/// Source identifier recorded as provenance.
pub const WORLD_RANKINGS: &str = "world_rankings";

/// Source for the world ranking table.
pub struct WorldRankingSource {
    base_url: String,
}

impl WorldRankingSource {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// One row of the upstream ranking payload. Every field is optional so a
/// sparse or renamed column degrades a row instead of failing the parse.
#[derive(Debug, Deserialize)]
struct RankingRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    rank: Option<i32>,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    events: Option<i32>,
}

#[async_trait]
impl Source for WorldRankingSource {
    fn id(&self) -> &'static str {
        WORLD_RANKINGS
    }

    async fn fetch(
        &self,
        session: &Session,
        _params: &FetchParams,
    ) -> Result<FetchOutcome, FetchError> {
        let url = format!("{}/rankings", self.base_url);
        let response = session
            .client()
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| classify_reqwest(WORLD_RANKINGS, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(WORLD_RANKINGS, status, &body));
        }

        let rows: Vec<RankingRow> = response
            .json()
            .await
            .map_err(|e| classify_reqwest(WORLD_RANKINGS, e))?;

        let fetched_at = Utc::now();
        let mut outcome = FetchOutcome::default();

        for row in rows {
            let name = row.name.unwrap_or_default();
            if let Err(rejection) = check_name(&name) {
                debug!(
                    name = %name,
                    reason = rejection.as_str(),
                    "dropping implausible ranking row"
                );
                outcome.skipped += 1;
                continue;
            }

            outcome.records.push(RawRecord {
                name,
                country: normalize_country(row.country.as_deref()),
                // Non-positive ranks are junk, treated as absent
                rank: row.rank.filter(|r| *r > 0),
                points: row.points.filter(|p| p.is_finite() && *p >= 0.0),
                events_played: row.events.filter(|e| *e >= 0),
                position: None,
                total_score: None,
                source: WORLD_RANKINGS,
                fetched_at,
            });
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_rows_tolerate_missing_fields() {
        let json = r#"[
            {"name": "Scottie Scheffler", "country": "usa", "rank": 1, "points": 12.9, "events": 44},
            {"name": "Jon Rahm"},
            {"country": "ESP", "rank": 3}
        ]"#;
        let rows: Vec<RankingRow> = serde_json::from_str(json).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].rank, Some(1));
        assert_eq!(rows[1].country, None);
        assert_eq!(rows[2].name, None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let source = WorldRankingSource::new("https://rankings.test/");
        assert_eq!(source.base_url, "https://rankings.test");
    }
}
