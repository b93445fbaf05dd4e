//! # Data Models
//!
//! This module contains all the SeaORM entity models used throughout the
//! caddie scraping service.

pub mod player;
pub mod scrape_run;
pub mod tournament;
pub mod tournament_score;

pub use player::Entity as Player;
pub use scrape_run::Entity as ScrapeRun;
pub use tournament::Entity as Tournament;
pub use tournament_score::Entity as TournamentScore;
