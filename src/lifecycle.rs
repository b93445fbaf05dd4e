//! Tournament lifecycle automator
//!
//! Flips tournaments through upcoming, active and completed based purely on
//! their scheduled window and the current wall clock. Transitions only ever
//! move forward, and a pass with an unchanged clock is a no-op.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::models::tournament;
use crate::repositories::tournament::TournamentRepository;

/// Lifecycle states a tournament moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TournamentStatus {
    Upcoming,
    Active,
    Completed,
}

impl TournamentStatus {
    /// Return the canonical string representation stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }

    /// Parse a stored status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(TournamentStatus::Upcoming),
            "active" => Some(TournamentStatus::Active),
            "completed" => Some(TournamentStatus::Completed),
            _ => None,
        }
    }

    /// Position in the forward-only progression.
    const fn phase(self) -> u8 {
        match self {
            TournamentStatus::Upcoming => 0,
            TournamentStatus::Active => 1,
            TournamentStatus::Completed => 2,
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a tournament should hold at `now`, derived from its window alone.
/// The window is inclusive on both ends: play is active from the scheduled
/// start through the scheduled end.
pub fn expected_status(
    now: DateTime<FixedOffset>,
    starts_at: DateTime<FixedOffset>,
    ends_at: DateTime<FixedOffset>,
) -> TournamentStatus {
    if now < starts_at {
        TournamentStatus::Upcoming
    } else if now <= ends_at {
        TournamentStatus::Active
    } else {
        TournamentStatus::Completed
    }
}

/// Forward-only step from `current` toward `expected`. Returns `None` when no
/// transition is due, including when the clock would imply moving backward.
pub fn advance(current: TournamentStatus, expected: TournamentStatus) -> Option<TournamentStatus> {
    (expected.phase() > current.phase()).then_some(expected)
}

/// Tournaments transitioned by one automator pass.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// How many open tournaments the pass looked at
    pub examined: usize,
    pub activated: Vec<tournament::Model>,
    pub completed: Vec<tournament::Model>,
}

impl SweepOutcome {
    /// Total number of rows transitioned in the pass
    pub fn changes(&self) -> usize {
        self.activated.len() + self.completed.len()
    }
}

/// Recomputes tournament states from the wall clock on its own cadence,
/// independent of scraping outcomes.
pub struct LifecycleAutomator {
    tournaments: TournamentRepository,
}

impl LifecycleAutomator {
    /// Create a new automator over the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tournaments: TournamentRepository::new(db),
        }
    }

    /// One pass over every tournament that is not yet completed.
    ///
    /// A tournament whose window already closed while it was still upcoming
    /// moves straight to completed. Rows with an unrecognized status string
    /// are left alone and logged.
    pub async fn sweep(&self, now: DateTime<FixedOffset>) -> Result<SweepOutcome, DbErr> {
        let open = self.tournaments.list_unfinished().await?;
        let mut outcome = SweepOutcome {
            examined: open.len(),
            ..SweepOutcome::default()
        };

        for row in open {
            let Some(current) = TournamentStatus::parse(&row.status) else {
                warn!(
                    tournament = %row.name,
                    status = %row.status,
                    "Skipping tournament with unrecognized status"
                );
                continue;
            };
            let expected = expected_status(now, row.starts_at, row.ends_at);
            let Some(next) = advance(current, expected) else {
                continue;
            };

            let updated = self.tournaments.set_status(row, next, now).await?;
            info!(
                tournament = %updated.name,
                from = %current,
                to = %next,
                "Tournament status advanced"
            );
            match next {
                TournamentStatus::Active => outcome.activated.push(updated),
                TournamentStatus::Completed => outcome.completed.push(updated),
                TournamentStatus::Upcoming => {}
            }
        }

        counter!("lifecycle_activated_total").increment(outcome.activated.len() as u64);
        counter!("lifecycle_completed_total").increment(outcome.completed.len() as u64);
        Ok(outcome)
    }
}
