//! Live leaderboard source.
//!
//! Fetches the in-play leaderboard for one tournament. Position and total
//! come over the wire as display strings ("T5", "E", "-12"); unparseable
//! values degrade to absent rather than failing the row.

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
pub const LIVE_LEADERBOARD: &str = "live_leaderboard";

/// Source for per-tournament live leaderboards.
pub struct LiveLeaderboardSource {
    base_url: String,
}

impl LiveLeaderboardSource {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// One row of the upstream leaderboard payload.
#[derive(Debug, Deserialize)]
struct LeaderboardRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    total: Option<String>,
}

/// Parses a leaderboard position cell. Ties render with a leading `T`
/// ("T5"); anything non-numeric after that is not a position.
fn parse_position(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(['T', 't'])
        .unwrap_or(trimmed);
    digits.parse::<i32>().ok().filter(|p| *p > 0)
}

/// Parses a total-to-par cell: "E" is even, "+3" over, "-12" under.
fn parse_total(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("e") {
        return Some(0);
    }
    trimmed.strip_prefix('+').unwrap_or(trimmed).parse().ok()
}

#[async_trait]
impl Source for LiveLeaderboardSource {
    fn id(&self) -> &'static str {
        LIVE_LEADERBOARD
    }

    async fn fetch(
        &self,
        session: &Session,
        params: &FetchParams,
    ) -> Result<FetchOutcome, FetchError> {
        let Some(tournament_ref) = params.tournament_ref.as_deref() else {
            return Err(FetchError::permanent(
                LIVE_LEADERBOARD,
                "leaderboard fetch requires a tournament ref",
            ));
        };

        let url = format!("{}/leaderboard/{}", self.base_url, tournament_ref);
        let response = session
            .client()
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| classify_reqwest(LIVE_LEADERBOARD, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(LIVE_LEADERBOARD, status, &body));
        }

        let rows: Vec<LeaderboardRow> = response
            .json()
            .await
            .map_err(|e| classify_reqwest(LIVE_LEADERBOARD, e))?;

        let fetched_at = Utc::now();
        let mut outcome = FetchOutcome::default();

        for row in rows {
            let name = row.name.unwrap_or_default();
            if let Err(rejection) = check_name(&name) {
                debug!(
                    name = %name,
                    tournament_ref,
                    reason = rejection.as_str(),
                    "dropping implausible leaderboard row"
                );
                outcome.skipped += 1;
                continue;
            }

            outcome.records.push(RawRecord {
                name,
                country: normalize_country(row.country.as_deref()),
                rank: None,
                points: None,
                events_played: None,
                position: row.position.as_deref().and_then(parse_position),
                total_score: row.total.as_deref().and_then(parse_total),
                source: LIVE_LEADERBOARD,
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
    fn positions_parse_with_tie_prefix() {
        assert_eq!(parse_position("1"), Some(1));
        assert_eq!(parse_position("T5"), Some(5));
        assert_eq!(parse_position("t12"), Some(12));
        assert_eq!(parse_position(" T3 "), Some(3));
        assert_eq!(parse_position("-"), None);
        assert_eq!(parse_position("CUT"), None);
        assert_eq!(parse_position("0"), None);
    }

    #[test]
    fn totals_parse_relative_to_par() {
        assert_eq!(parse_total("-12"), Some(-12));
        assert_eq!(parse_total("E"), Some(0));
        assert_eq!(parse_total("e"), Some(0));
        assert_eq!(parse_total("+3"), Some(3));
        assert_eq!(parse_total("7"), Some(7));
        assert_eq!(parse_total("--"), None);
        assert_eq!(parse_total(""), None);
    }

    #[test]
    fn leaderboard_rows_tolerate_missing_fields() {
        let json = r#"[
            {"name": "Rory McIlroy", "country": "NIR", "position": "T2", "total": "-9"},
            {"name": "Shane Lowry", "position": "4"},
            {"position": "5", "total": "-3"}
        ]"#;
        let rows: Vec<LeaderboardRow> = serde_json::from_str(json).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].total.as_deref(), Some("-9"));
        assert_eq!(rows[1].total, None);
        assert_eq!(rows[2].name, None);
    }
}
