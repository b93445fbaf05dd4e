//! Sources module
//!
//! This module provides the scraping side of the engine including:
//! - The `Source` trait defining the interface for all upstream feeds
//! - A registry for id-based source lookup
//! - The retrying fetch driver shared by all jobs
//! - Record validation applied before anything reaches the database

pub mod fetch;
pub mod live_leaderboard;
pub mod registry;
pub mod trait_;
pub mod validate;
pub mod world_rankings;

pub use fetch::fetch_with_retry;
pub use registry::{RegistryError, SourceRegistry};
pub use trait_::{FetchError, FetchErrorKind, FetchOutcome, FetchParams, RawRecord, Source};

pub use live_leaderboard::{LIVE_LEADERBOARD, LiveLeaderboardSource};
pub use world_rankings::{WORLD_RANKINGS, WorldRankingSource};
