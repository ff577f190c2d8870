use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    models::RecommendationProfile,
    services::{
        providers::MovieCatalog, recommendations::RecommendationEngine,
        watch_history::WatchHistoryStore,
    },
};

/// Shared application state
///
/// Collaborators are trait objects so tests can swap in an in-memory history
/// and a stub catalog.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MovieCatalog>,
    pub history: Arc<dyn WatchHistoryStore>,
    pub engine: RecommendationEngine,
    /// Deadline for each individual catalog lookup
    pub upstream_timeout: Duration,
    pub home_profile: RecommendationProfile,
    pub page_profile: RecommendationProfile,
}

impl AppState {
    /// Creates state with the default home and page profiles
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        history: Arc<dyn WatchHistoryStore>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            engine: RecommendationEngine::new(catalog.clone(), upstream_timeout),
            upstream_timeout,
            catalog,
            history,
            home_profile: RecommendationProfile::home(),
            page_profile: RecommendationProfile::page(),
        }
    }

    /// Creates state with timeouts and profiles taken from configuration
    pub fn from_config(
        config: &Config,
        catalog: Arc<dyn MovieCatalog>,
        history: Arc<dyn WatchHistoryStore>,
    ) -> Self {
        Self::new(catalog, history, config.upstream_timeout())
            .with_profiles(config.home_profile(), config.page_profile())
    }

    pub fn with_profiles(
        mut self,
        home_profile: RecommendationProfile,
        page_profile: RecommendationProfile,
    ) -> Self {
        self.home_profile = home_profile;
        self.page_profile = page_profile;
        self
    }
}
