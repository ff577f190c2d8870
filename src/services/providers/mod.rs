/// Movie catalog abstraction
///
/// The recommendation engine, search and the watched list only talk to the catalog
/// through [`MovieCatalog`], so the TMDB client can be swapped for a stub in tests.
use std::future::Future;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{GenreId, Movie, MovieDetails, MovieId, SearchResults, TrendingWindow},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Awaits an upstream call, turning an elapsed deadline into [`AppError::Timeout`]
pub async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| AppError::Timeout(timeout.as_millis()))?
}

/// Read-only access to an external movie catalog
///
/// Every call is idempotent and side-effect free on the catalog. Calls return
/// `Err` on upstream failure; callers that treat a lookup as non-critical fold
/// the error into an empty contribution themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fetch a single movie; `NotFound` when the id is unknown
    async fn get_movie(&self, id: MovieId) -> AppResult<Movie>;

    /// Fetch a movie together with reviews, credits and certification
    async fn get_movie_details(&self, id: MovieId) -> AppResult<MovieDetails>;

    /// Fetch several movies concurrently, each lookup bounded by `lookup_timeout`
    ///
    /// Best effort: ids that fail or time out individually are dropped without retry
    /// and the remaining movies keep the order of `ids`. Only fails when every lookup failed.
    async fn get_movies_by_ids(
        &self,
        ids: Vec<MovieId>,
        lookup_timeout: Duration,
    ) -> AppResult<Vec<Movie>> {
        let mut tasks = Vec::new();

        for id in ids {
            let catalog = self.clone_for_task();
            let task = tokio::spawn(async move {
                with_timeout(lookup_timeout, catalog.get_movie(id)).await
            });
            tasks.push((id, task));
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for (id, task) in tasks {
            match task.await {
                Ok(Ok(movie)) => results.push(movie),
                Ok(Err(e)) => {
                    tracing::warn!(movie_id = id, error = %e, "Movie lookup failed");
                    errors.push(e);
                }
                Err(e) => {
                    tracing::error!(movie_id = id, error = %e, "Task join error");
                    errors.push(AppError::Internal(e.to_string()));
                }
            }
        }

        if !errors.is_empty() {
            tracing::warn!(
                success_count = results.len(),
                error_count = errors.len(),
                "Partial movie lookup failure"
            );
        }

        if results.is_empty() && !errors.is_empty() {
            return Err(AppError::ExternalApi(
                "Failed to fetch any movie details".to_string(),
            ));
        }

        Ok(results)
    }

    /// Movies TMDB considers similar to `id`
    async fn get_similar(&self, id: MovieId) -> AppResult<Vec<Movie>>;

    /// TMDB's own recommendations for `id`
    async fn get_recommendations(&self, id: MovieId) -> AppResult<Vec<Movie>>;

    /// Popular movies having all of `genre_ids`, most popular first
    ///
    /// Returns an empty list without calling upstream when `genre_ids` is empty.
    async fn discover_by_genres(&self, genre_ids: Vec<GenreId>) -> AppResult<Vec<Movie>>;

    /// Free-text title search; a blank query yields empty results without calling upstream
    async fn search(&self, query: &str, page: u32) -> AppResult<SearchResults>;

    async fn trending(&self, window: TrendingWindow) -> AppResult<Vec<Movie>>;

    /// Top ten of the given popular-list page
    async fn popular(&self, page: u32) -> AppResult<Vec<Movie>>;

    /// Clone the catalog for spawned lookups
    fn clone_for_task(&self) -> Box<dyn MovieCatalog>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}
