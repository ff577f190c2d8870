/// TMDB (The Movie Database) v3 provider
///
/// Every request is keyed by the `api_key` query parameter. Responses are cached
/// in Redis through the `cached!` macro; list lookups expire sooner than details.
///
/// Endpoints used:
/// - `/movie/{id}` plus `/reviews`, `/credits`, `/release_dates` for details
/// - `/movie/{id}/similar` and `/movie/{id}/recommendations`
/// - `/discover/movie` sorted by popularity for genre discovery
/// - `/search/movie`, `/trending/movie/{window}`, `/movie/popular`
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        GenreId, Movie, MovieDetails, MovieId, Review, SearchResults, TmdbCredits, TmdbPage,
        TmdbReleaseDates, TrendingWindow,
    },
    services::providers::MovieCatalog,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
const LIST_CACHE_TTL: u64 = 21600; // 6 hours
const FEED_CACHE_TTL: u64 = 3600; // 1 hour

const MAX_REVIEWS: usize = 5;
const MAX_CAST: usize = 8;
const MAX_CREW: usize = 6;
const POPULAR_LIMIT: usize = 10;
const CREW_JOBS: [&str; 3] = ["Director", "Writer", "Screenplay"];

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    /// Creates a provider whose HTTP client gives up on any request after `timeout`
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// GETs a TMDB path and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {}", path)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_list(&self, path: &str, params: &[(&str, String)]) -> AppResult<Vec<Movie>> {
        let page: TmdbPage<Movie> = self.get_json(path, params).await?;

        tracing::debug!(
            path = %path,
            results = page.results.len(),
            provider = "tmdb",
            "List fetched"
        );

        Ok(page.results)
    }

    async fn fetch_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        self.get_json(&format!("/movie/{}", id), &[]).await
    }

    /// Details plus reviews, credits and release dates, fetched concurrently
    ///
    /// Only the details request is required; the others degrade to empty.
    async fn fetch_full_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        let reviews_path = format!("/movie/{}/reviews", id);
        let credits_path = format!("/movie/{}/credits", id);
        let releases_path = format!("/movie/{}/release_dates", id);

        let (details, reviews, credits, releases) = tokio::join!(
            self.fetch_details(id),
            self.get_json::<TmdbPage<Review>>(&reviews_path, &[]),
            self.get_json::<TmdbCredits>(&credits_path, &[]),
            self.get_json::<TmdbReleaseDates>(&releases_path, &[]),
        );

        let mut details = details?;

        match reviews {
            Ok(page) => details.reviews = page.results.into_iter().take(MAX_REVIEWS).collect(),
            Err(e) => tracing::warn!(movie_id = id, error = %e, "Reviews unavailable"),
        }

        match credits {
            Ok(credits) => {
                details.cast = credits.cast.into_iter().take(MAX_CAST).collect();
                details.crew = credits
                    .crew
                    .into_iter()
                    .filter(|member| CREW_JOBS.contains(&member.job.as_str()))
                    .take(MAX_CREW)
                    .collect();
            }
            Err(e) => tracing::warn!(movie_id = id, error = %e, "Credits unavailable"),
        }

        match releases {
            Ok(releases) => details.age_rating = releases.certification(),
            Err(e) => tracing::warn!(movie_id = id, error = %e, "Release dates unavailable"),
        }

        if details.movie.genre_ids.is_empty() {
            details.movie.genre_ids = details.genres.iter().map(|g| g.id).collect();
        }

        Ok(details)
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbProvider {
    async fn get_movie(&self, id: MovieId) -> AppResult<Movie> {
        cached!(
            self.cache,
            CacheKey::Movie(id),
            DETAILS_CACHE_TTL,
            async move { self.fetch_details(id).await.map(Movie::from) }
        )
    }

    async fn get_movie_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(id),
            DETAILS_CACHE_TTL,
            async move {
                let details = self.fetch_full_details(id).await?;

                tracing::info!(
                    movie_id = id,
                    cast = details.cast.len(),
                    reviews = details.reviews.len(),
                    provider = "tmdb",
                    "Movie details fetched"
                );

                Ok::<_, AppError>(details)
            }
        )
    }

    async fn get_similar(&self, id: MovieId) -> AppResult<Vec<Movie>> {
        cached!(
            self.cache,
            CacheKey::Similar(id),
            LIST_CACHE_TTL,
            async move {
                self.fetch_list(&format!("/movie/{}/similar", id), &[("page", "1".to_string())])
                    .await
            }
        )
    }

    async fn get_recommendations(&self, id: MovieId) -> AppResult<Vec<Movie>> {
        cached!(
            self.cache,
            CacheKey::Recommendations(id),
            LIST_CACHE_TTL,
            async move {
                self.fetch_list(
                    &format!("/movie/{}/recommendations", id),
                    &[("page", "1".to_string())],
                )
                .await
            }
        )
    }

    async fn discover_by_genres(&self, genre_ids: Vec<GenreId>) -> AppResult<Vec<Movie>> {
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }

        let with_genres = genre_ids
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",");

        cached!(
            self.cache,
            CacheKey::Discover(genre_ids),
            LIST_CACHE_TTL,
            async move {
                self.fetch_list(
                    "/discover/movie",
                    &[
                        ("with_genres", with_genres),
                        ("sort_by", "popularity.desc".to_string()),
                        ("page", "1".to_string()),
                    ],
                )
                .await
            }
        )
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<SearchResults> {
        if query.trim().is_empty() {
            return Ok(SearchResults::empty());
        }

        cached!(
            self.cache,
            CacheKey::Search {
                query: query.to_string(),
                page,
            },
            FEED_CACHE_TTL,
            async move {
                let response: TmdbPage<Movie> = self
                    .get_json(
                        "/search/movie",
                        &[("query", query.to_string()), ("page", page.to_string())],
                    )
                    .await?;

                tracing::info!(
                    query = %query,
                    page,
                    results = response.results.len(),
                    total_results = response.total_results,
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(SearchResults {
                    results: response.results,
                    total_pages: response.total_pages,
                    total_results: response.total_results,
                })
            }
        )
    }

    async fn trending(&self, window: TrendingWindow) -> AppResult<Vec<Movie>> {
        cached!(
            self.cache,
            CacheKey::Trending(window),
            FEED_CACHE_TTL,
            async move {
                self.fetch_list(&format!("/trending/movie/{}", window), &[])
                    .await
            }
        )
    }

    async fn popular(&self, page: u32) -> AppResult<Vec<Movie>> {
        cached!(
            self.cache,
            CacheKey::Popular(page),
            FEED_CACHE_TTL,
            async move {
                let mut movies = self
                    .fetch_list("/movie/popular", &[("page", page.to_string())])
                    .await?;
                movies.truncate(POPULAR_LIMIT);
                Ok::<_, AppError>(movies)
            }
        )
    }

    fn clone_for_task(&self) -> Box<dyn MovieCatalog> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_redis_client;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const TEST_KEY: &str = "test_key";

    fn movie_json(id: i64, title: &str, genres: &[i64]) -> Value {
        json!({
            "id": id,
            "title": title,
            "overview": "",
            "popularity": 10.0,
            "genre_ids": genres,
        })
    }

    fn page_json(results: Vec<Value>) -> Value {
        let total = results.len();
        json!({ "page": 1, "results": results, "total_pages": 1, "total_results": total })
    }

    fn authorized(params: &HashMap<String, String>) -> bool {
        params.get("api_key").map(String::as_str) == Some(TEST_KEY)
    }

    async fn movie_handler(
        Path(id): Path<i64>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        if !authorized(&params) {
            return (AxumStatus::UNAUTHORIZED, Json(json!({}))).into_response();
        }
        match id {
            603 => Json(json!({
                "id": 603,
                "title": "The Matrix",
                "popularity": 70.0,
                "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
                "runtime": 136,
                "status": "Released"
            }))
            .into_response(),
            500 => (AxumStatus::INTERNAL_SERVER_ERROR, "boom").into_response(),
            _ => (AxumStatus::NOT_FOUND, Json(json!({"status_code": 34}))).into_response(),
        }
    }

    async fn credits_handler(Path(_id): Path<i64>) -> Json<Value> {
        let cast: Vec<Value> = (0..12)
            .map(|i| json!({"id": i, "name": format!("Actor {}", i), "character": "Someone"}))
            .collect();
        Json(json!({
            "cast": cast,
            "crew": [
                {"id": 100, "name": "Lana", "job": "Director", "department": "Directing"},
                {"id": 101, "name": "Bill", "job": "Director of Photography", "department": "Camera"},
                {"id": 102, "name": "Lilly", "job": "Screenplay", "department": "Writing"}
            ]
        }))
    }

    async fn release_dates_handler(Path(_id): Path<i64>) -> Json<Value> {
        Json(json!({
            "results": [
                {"iso_3166_1": "GB", "release_dates": [{"certification": "15"}]},
                {"iso_3166_1": "US", "release_dates": [{"certification": ""}, {"certification": "R"}]}
            ]
        }))
    }

    async fn popular_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
        let results = (1..=20).map(|i| movie_json(i, "Popular", &[])).collect();
        Json(page_json(results))
    }

    async fn discover_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("with_genres").map(String::as_str), Some("28,12"));
        assert_eq!(
            params.get("sort_by").map(String::as_str),
            Some("popularity.desc")
        );
        Json(page_json(vec![movie_json(1, "Discovered", &[28, 12])]))
    }

    async fn search_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("query").map(String::as_str), Some("matrix"));
        Json(json!({
            "page": 2,
            "results": [movie_json(603, "The Matrix", &[28])],
            "total_pages": 3,
            "total_results": 41
        }))
    }

    /// Serves a small TMDB look-alike on an ephemeral port and returns its base URL
    async fn spawn_fake_tmdb() -> String {
        let app = Router::new()
            .route("/movie/popular", get(popular_handler))
            .route("/movie/:id", get(movie_handler))
            .route(
                "/movie/:id/similar",
                get(|| async { Json(page_json(vec![movie_json(604, "Reloaded", &[28])])) }),
            )
            .route("/movie/:id/reviews", get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }))
            .route("/movie/:id/credits", get(credits_handler))
            .route("/movie/:id/release_dates", get(release_dates_handler))
            .route("/discover/movie", get(discover_handler))
            .route("/search/movie", get(search_handler));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn provider_for(api_url: String) -> TmdbProvider {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client);
        TmdbProvider::new(cache, TEST_KEY.to_string(), api_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_endpoint_trims_trailing_slash() {
        let provider = provider_for("https://api.themoviedb.org/3/".to_string());
        assert_eq!(
            provider.endpoint("/movie/603"),
            "https://api.themoviedb.org/3/movie/603"
        );
    }

    #[tokio::test]
    async fn test_blank_search_skips_upstream() {
        // Nothing listens here; reaching upstream would fail the call
        let provider = provider_for("http://127.0.0.1:1".to_string());
        let results = provider.search("   ", 1).await.unwrap();
        assert_eq!(results, SearchResults::empty());
    }

    #[tokio::test]
    async fn test_discover_without_genres_skips_upstream() {
        let provider = provider_for("http://127.0.0.1:1".to_string());
        let movies = provider.discover_by_genres(vec![]).await.unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_an_error() {
        let provider = provider_for("http://127.0.0.1:1".to_string());
        let result = provider.get_similar(603).await;
        assert!(matches!(result, Err(AppError::HttpClient(_))));
    }

    #[tokio::test]
    async fn test_get_movie_derives_genre_ids() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let movie = provider.get_movie(603).await.unwrap();
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.genre_ids, vec![28, 878]);
    }

    #[tokio::test]
    async fn test_get_movie_not_found() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let result = provider.get_movie(999).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_movie_upstream_error() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let result = provider.get_movie(500).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_get_movies_by_ids_omits_failures_and_keeps_order() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let movies = provider
            .get_movies_by_ids(vec![999, 603, 500], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, 603);
    }

    #[tokio::test]
    async fn test_get_movies_by_ids_all_failed() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let result = provider
            .get_movies_by_ids(vec![999, 500], Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_movie_details_trims_credits_and_picks_certification() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let details = provider.get_movie_details(603).await.unwrap();

        assert_eq!(details.cast.len(), 8);
        let jobs: Vec<&str> = details.crew.iter().map(|c| c.job.as_str()).collect();
        assert_eq!(jobs, vec!["Director", "Screenplay"]);
        assert_eq!(details.age_rating, Some("R".to_string()));
        // reviews endpoint fails upstream; details still succeed
        assert!(details.reviews.is_empty());
        assert_eq!(details.movie.genre_ids, vec![28, 878]);
    }

    #[tokio::test]
    async fn test_popular_keeps_top_ten() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let movies = provider.popular(2).await.unwrap();
        assert_eq!(movies.len(), 10);
        assert_eq!(movies[0].id, 1);
    }

    #[tokio::test]
    async fn test_discover_passes_genres_and_sort() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let movies = provider.discover_by_genres(vec![28, 12]).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].genre_ids, vec![28, 12]);
    }

    #[tokio::test]
    async fn test_search_returns_paging_totals() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let results = provider.search("matrix", 2).await.unwrap();
        assert_eq!(results.results.len(), 1);
        assert_eq!(results.total_pages, 3);
        assert_eq!(results.total_results, 41);
    }

    #[tokio::test]
    async fn test_similar_parses_list() {
        let provider = provider_for(spawn_fake_tmdb().await);
        let movies = provider.get_similar(603).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Reloaded");
    }
}
