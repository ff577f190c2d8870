use std::time::Duration;

use crate::{
    error::AppResult,
    models::{Movie, UserId},
    services::{providers::MovieCatalog, watch_history::WatchHistoryStore},
};

/// Resolves a user's watched list to movies, most recent first
///
/// When `title_filter` is given, only movies whose title contains it
/// (case-insensitive) are kept. Movies the catalog cannot resolve within
/// `lookup_timeout` are dropped.
pub async fn list_watched_movies(
    history: &dyn WatchHistoryStore,
    catalog: &dyn MovieCatalog,
    user_id: UserId,
    title_filter: Option<&str>,
    lookup_timeout: Duration,
) -> AppResult<Vec<Movie>> {
    let ids = history.list_watched(user_id).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let movies = catalog.get_movies_by_ids(ids, lookup_timeout).await?;

    let movies = match title_filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => {
            let needle = filter.to_lowercase();
            movies
                .into_iter()
                .filter(|movie| movie.title.to_lowercase().contains(&needle))
                .collect()
        }
        None => movies,
    };

    tracing::debug!(user_id, count = movies.len(), "Watched movies resolved");

    Ok(movies)
}
