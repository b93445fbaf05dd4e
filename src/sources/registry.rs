//! Source registry
//!
//! In-memory registry mapping source identifiers to implementations, so runs
//! resolve their source by id and tests can swap in fakes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::FetchConfig;

use super::live_leaderboard::LiveLeaderboardSource;
use super::trait_::Source;
use super::world_rankings::WorldRankingSource;

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Source '{id}' not found")]
    SourceNotFound { id: String },
}

/// Registry of fetchable sources.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<&'static str, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Build the registry with the production sources from configuration.
    pub fn from_config(fetch: &FetchConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WorldRankingSource::new(
            fetch.rankings_base_url.clone(),
        )));
        registry.register(Arc::new(LiveLeaderboardSource::new(
            fetch.leaderboard_base_url.clone(),
        )));
        registry
    }

    /// Register a source under its own id
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id(), source);
    }

    /// Get a source by id
    pub fn get(&self, id: &str) -> Result<Arc<dyn Source>, RegistryError> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::SourceNotFound { id: id.to_string() })
    }

    /// Registered source ids, sorted for stable ordering
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.sources.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::live_leaderboard::LIVE_LEADERBOARD;
    use crate::sources::world_rankings::WORLD_RANKINGS;

    fn fetch_config() -> FetchConfig {
        FetchConfig {
            rankings_base_url: "https://rankings.test".to_string(),
            leaderboard_base_url: "https://leaderboard.test".to_string(),
            ..FetchConfig::default()
        }
    }

    #[test]
    fn unknown_source_is_an_error() {
        let registry = SourceRegistry::new();

        let result = registry.get("unknown");
        assert!(matches!(
            result,
            Err(RegistryError::SourceNotFound { id }) if id == "unknown"
        ));
    }

    #[test]
    fn from_config_registers_both_sources() {
        let registry = SourceRegistry::from_config(&fetch_config());

        assert!(registry.get(WORLD_RANKINGS).is_ok());
        assert!(registry.get(LIVE_LEADERBOARD).is_ok());
        assert_eq!(registry.ids(), vec![LIVE_LEADERBOARD, WORLD_RANKINGS]);
    }
}
