//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for the canonical store, one repository per aggregate.

pub mod player;
pub mod tournament;

pub use player::PlayerRepository;
pub use tournament::{ScoreWrite, TournamentRepository};
