use crate::{
    models::{Movie, RecommendationProfile, TrendingWindow, UserId},
    services::{
        providers::MovieCatalog,
        recommendations::{RecommendationEngine, UserRecommendations},
        watch_history::WatchHistoryStore,
    },
};

/// Everything shown on a user's home page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeFeed {
    pub trending: Vec<Movie>,
    pub popular: Vec<Movie>,
    pub recommendations: Vec<Movie>,
}

/// Builds the home feed; each section is fetched independently and renders
/// empty when its source fails.
pub async fn home_feed(
    catalog: &dyn MovieCatalog,
    engine: &RecommendationEngine,
    history: &dyn WatchHistoryStore,
    user_id: UserId,
    profile: &RecommendationProfile,
) -> HomeFeed {
    let (trending, popular, recommendations) = tokio::join!(
        catalog.trending(TrendingWindow::Week),
        catalog.popular(1),
        engine.recommend_for_user(history, user_id, profile),
    );

    HomeFeed {
        trending: trending.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch trending movies for home feed");
            Vec::new()
        }),
        popular: popular.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch popular movies for home feed");
            Vec::new()
        }),
        recommendations: recommendations
            .map(UserRecommendations::into_movies)
            .unwrap_or_else(|e| {
                tracing::warn!(user_id, error = %e, "Failed to build home feed recommendations");
                Vec::new()
            }),
    }
}
