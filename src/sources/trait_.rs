//! Source trait definition
//!
//! Defines the interface the ranking and leaderboard sources implement, plus
//! the raw record type and the classified fetch error the retry driver acts
//! on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::session::Session;

/// One row as fetched from a source, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Player name as printed by the source
    pub name: String,
    /// Country code if the source carries one
    pub country: Option<String>,
    /// World rank, from the ranking source
    pub rank: Option<i32>,
    /// Accumulated ranking points
    pub points: Option<f64>,
    /// Counted events in the ranking window
    pub events_played: Option<i32>,
    /// Leaderboard position, from the leaderboard source
    pub position: Option<i32>,
    /// Total score relative to par
    pub total_score: Option<i32>,
    /// Identifier of the source that produced this record
    pub source: &'static str,
    /// When the fetch happened
    pub fetched_at: DateTime<Utc>,
}

impl RawRecord {
    /// Empty record carrying only name and provenance, for building up in
    /// sources and tests.
    pub fn named<S: Into<String>>(source: &'static str, name: S) -> Self {
        Self {
            name: name.into(),
            country: None,
            rank: None,
            points: None,
            events_played: None,
            position: None,
            total_score: None,
            source,
            fetched_at: Utc::now(),
        }
    }
}

/// Result of a fetch: plausible records plus the count of rows dropped by
/// name validation.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<RawRecord>,
    pub skipped: u64,
}

/// Scoping parameters for a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    /// External ref of the tournament to fetch, for leaderboard sources
    pub tournament_ref: Option<String>,
}

impl FetchParams {
    pub fn for_tournament<S: Into<String>>(external_ref: S) -> Self {
        Self {
            tournament_ref: Some(external_ref.into()),
        }
    }
}

/// Fetch error carrying a classification the retry driver acts on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FetchError {
    #[serde(flatten)]
    pub kind: FetchErrorKind,
    pub source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Retryable: network trouble, 5xx, rate limiting, malformed payload
    Transient,
    /// Not retryable: 4xx, unknown tournament, bad request shape
    Permanent,
    /// The shared session is unusable and must be discarded before retrying
    SessionCrashed,
}

impl FetchError {
    pub fn transient<S: Into<String>>(source_id: &str, message: S) -> Self {
        Self {
            kind: FetchErrorKind::Transient,
            source_id: source_id.to_string(),
            message: Some(message.into()),
        }
    }

    pub fn permanent<S: Into<String>>(source_id: &str, message: S) -> Self {
        Self {
            kind: FetchErrorKind::Permanent,
            source_id: source_id.to_string(),
            message: Some(message.into()),
        }
    }

    pub fn session_crashed<S: Into<String>>(source_id: &str, message: S) -> Self {
        Self {
            kind: FetchErrorKind::SessionCrashed,
            source_id: source_id.to_string(),
            message: Some(message.into()),
        }
    }

    /// Whether the retry driver may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            FetchErrorKind::Transient | FetchErrorKind::SessionCrashed
        )
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FetchErrorKind::Transient => write!(f, "transient fetch error")?,
            FetchErrorKind::Permanent => write!(f, "permanent fetch error")?,
            FetchErrorKind::SessionCrashed => write!(f, "session crashed")?,
        }
        write!(f, " ({})", self.source_id)?;
        if let Some(msg) = &self.message {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for FetchError {}

/// Classify a transport-level reqwest failure.
pub(crate) fn classify_reqwest(source_id: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::transient(source_id, format!("request timed out: {}", err))
    } else if err.is_connect() {
        // Connection-level failures taint the shared session
        FetchError::session_crashed(source_id, format!("connection failed: {}", err))
    } else if err.is_decode() {
        FetchError::transient(source_id, format!("malformed payload: {}", err))
    } else {
        FetchError::transient(source_id, err.to_string())
    }
}

/// Classify a non-success HTTP status.
pub(crate) fn classify_status(source_id: &str, status: u16, body: &str) -> FetchError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        401 | 403 => FetchError::session_crashed(
            source_id,
            format!("source rejected the session (HTTP {}): {}", status, snippet),
        ),
        429 => FetchError::transient(source_id, format!("rate limited: {}", snippet)),
        400..=499 => {
            FetchError::permanent(source_id, format!("HTTP {}: {}", status, snippet))
        }
        _ => FetchError::transient(source_id, format!("HTTP {}: {}", status, snippet)),
    }
}

#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier, recorded as provenance on everything this source
    /// writes.
    fn id(&self) -> &'static str;

    /// Fetch one batch of raw records. Single attempt; retries live in
    /// [`fetch_with_retry`](crate::sources::fetch_with_retry).
    async fn fetch(
        &self,
        session: &Session,
        params: &FetchParams,
    ) -> Result<FetchOutcome, FetchError>;
}
