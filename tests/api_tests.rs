use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use marquee_api::{
    error::{AppError, AppResult},
    models::{
        Genre, GenreId, Movie, MovieDetails, MovieId, SearchResults, TrendingWindow,
    },
    routes::{create_router, AppState},
    services::{
        providers::MovieCatalog,
        watch_history::{InMemoryWatchHistory, WatchHistoryStore},
    },
};

/// Fixed in-memory catalog
#[derive(Clone)]
struct StubCatalog {
    movies: Arc<HashMap<MovieId, Movie>>,
    similar: Arc<HashMap<MovieId, Vec<Movie>>>,
    recommendations: Arc<HashMap<MovieId, Vec<Movie>>>,
    discover: Arc<Vec<Movie>>,
    search_fails: bool,
}

fn movie(id: MovieId, title: &str, popularity: f64, genre_ids: Vec<GenreId>) -> Movie {
    Movie::new(id, title)
        .with_popularity(popularity)
        .with_genres(genre_ids)
}

impl StubCatalog {
    fn new() -> Self {
        let movies = [
            movie(1, "Alien", 40.0, vec![27, 878]),
            movie(2, "Aliens", 35.0, vec![28, 878]),
            movie(3, "Heat", 30.0, vec![80]),
            movie(100, "Blade Runner", 50.0, vec![878]),
            movie(200, "The Thing", 10.0, vec![27]),
        ];

        let x = movie(100, "Blade Runner", 50.0, vec![878]);
        let y = movie(200, "The Thing", 10.0, vec![27]);

        Self {
            movies: Arc::new(movies.into_iter().map(|m| (m.id, m)).collect()),
            similar: Arc::new(HashMap::from([
                (1, vec![x.clone(), y.clone()]),
                (2, vec![y]),
            ])),
            recommendations: Arc::new(HashMap::from([(1, vec![x])])),
            discover: Arc::new(Vec::new()),
            search_fails: false,
        }
    }

    fn failing_search() -> Self {
        Self {
            search_fails: true,
            ..Self::new()
        }
    }
}

#[async_trait::async_trait]
impl MovieCatalog for StubCatalog {
    async fn get_movie(&self, id: MovieId) -> AppResult<Movie> {
        self.movies
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
    }

    async fn get_movie_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        let movie = self.get_movie(id).await?;
        let genres = movie
            .genre_ids
            .iter()
            .map(|&id| Genre {
                id,
                name: format!("Genre {}", id),
            })
            .collect();

        Ok(MovieDetails {
            movie,
            genres,
            runtime: Some(117),
            status: "Released".to_string(),
            tagline: None,
            budget: 0,
            revenue: 0,
            reviews: Vec::new(),
            cast: Vec::new(),
            crew: Vec::new(),
            age_rating: Some("R".to_string()),
        })
    }

    async fn get_similar(&self, id: MovieId) -> AppResult<Vec<Movie>> {
        Ok(self.similar.get(&id).cloned().unwrap_or_default())
    }

    async fn get_recommendations(&self, id: MovieId) -> AppResult<Vec<Movie>> {
        Ok(self.recommendations.get(&id).cloned().unwrap_or_default())
    }

    async fn discover_by_genres(&self, _genre_ids: Vec<GenreId>) -> AppResult<Vec<Movie>> {
        Ok(self.discover.as_ref().clone())
    }

    async fn search(&self, query: &str, _page: u32) -> AppResult<SearchResults> {
        if self.search_fails {
            return Err(AppError::ExternalApi("TMDB API returned status 503".into()));
        }

        let needle = query.to_lowercase();
        let results: Vec<Movie> = self
            .movies
            .values()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        Ok(SearchResults {
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        })
    }

    async fn trending(&self, _window: TrendingWindow) -> AppResult<Vec<Movie>> {
        Ok(vec![self.get_movie(100).await?])
    }

    async fn popular(&self, _page: u32) -> AppResult<Vec<Movie>> {
        Ok(vec![self.get_movie(1).await?, self.get_movie(3).await?])
    }

    fn clone_for_task(&self) -> Box<dyn MovieCatalog> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn create_test_server_with(catalog: StubCatalog) -> (TestServer, Arc<InMemoryWatchHistory>) {
    let history = Arc::new(InMemoryWatchHistory::new());
    let state = AppState::new(Arc::new(catalog), history.clone(), Duration::from_secs(2));
    let app = create_router(state);
    (TestServer::new(app).unwrap(), history)
}

fn create_test_server() -> (TestServer, Arc<InMemoryWatchHistory>) {
    create_test_server_with(StubCatalog::new())
}

fn ids(movies: &Value) -> Vec<i64> {
    movies
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_search_returns_paged_shape() {
    let (server, _) = create_test_server();

    let response = server
        .get("/api/v1/search")
        .add_query_param("q", "alien")
        .add_query_param("page", 2)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["query"], "alien");
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["totalResults"], 2);
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_blank_search_is_empty() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/search").add_query_param("q", "  ").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["query"], "");
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 0);
    assert!(body["movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_failure_keeps_shape() {
    let (server, _) = create_test_server_with(StubCatalog::failing_search());

    let response = server.get("/api/v1/search").add_query_param("q", "alien").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to search movies");
    assert_eq!(body["currentPage"], 1);
    assert!(body["movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_movie_details_and_not_found() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/movies/1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Alien");
    assert_eq!(body["age_rating"], "R");
    assert_eq!(body["poster_url"], "/placeholder-movie.jpg");

    server
        .get("/api/v1/movies/9999")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/v1/movies/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mark_and_unmark_are_idempotent() {
    let (server, history) = create_test_server();

    for _ in 0..2 {
        server
            .put("/api/v1/users/7/watched/1")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
    assert_eq!(history.list_watched(7).await.unwrap(), vec![1]);

    let status: Value = server.get("/api/v1/users/7/watched/1").await.json();
    assert_eq!(status["watched"], true);
    assert!(status["watched_at"].is_string());

    for _ in 0..2 {
        server
            .delete("/api/v1/users/7/watched/1")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let status: Value = server.get("/api/v1/users/7/watched/1").await.json();
    assert_eq!(status["watched"], false);
    assert!(status["watched_at"].is_null());
}

#[tokio::test]
async fn test_watched_list_filters_by_title() {
    let (server, _) = create_test_server();
    for movie_id in [1, 2, 3] {
        server.put(&format!("/api/v1/users/7/watched/{}", movie_id)).await;
    }

    let all: Value = server.get("/api/v1/users/7/watched").await.json();
    assert_eq!(ids(&all), vec![3, 2, 1]);

    let filtered: Value = server
        .get("/api/v1/users/7/watched")
        .add_query_param("q", "ALIEN")
        .await
        .json();
    assert_eq!(ids(&filtered), vec![2, 1]);
}

#[tokio::test]
async fn test_recommendations_without_history() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/users/7/recommendations").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(
        body["message"],
        "Watch some movies to get personalized recommendations!"
    );
}

#[tokio::test]
async fn test_recommendations_rank_by_signal_score() {
    let (server, _) = create_test_server();
    // Most recent first gives a history of [1, 2, 3]
    for movie_id in [3, 2, 1] {
        server.put(&format!("/api/v1/users/7/watched/{}", movie_id)).await;
    }

    let body: Value = server
        .get("/api/v1/users/7/recommendations")
        .add_query_param("profile", "page")
        .await
        .json();

    // The Thing scores 3 + 3, Blade Runner 3 + 2
    assert_eq!(ids(&body["recommendations"]), vec![200, 100]);
    assert!(body["message"].is_null());
}

#[tokio::test]
async fn test_recommendations_exclude_watched() {
    let (server, _) = create_test_server();
    for movie_id in [200, 1] {
        server.put(&format!("/api/v1/users/7/watched/{}", movie_id)).await;
    }

    let body: Value = server
        .get("/api/v1/users/7/recommendations")
        .add_query_param("profile", "home")
        .await
        .json();

    assert_eq!(ids(&body["recommendations"]), vec![100]);
}

#[tokio::test]
async fn test_home_feed() {
    let (server, _) = create_test_server();
    server.put("/api/v1/users/7/watched/2").await;

    let response = server.get("/api/v1/users/7/home").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body["trending"]), vec![100]);
    assert_eq!(ids(&body["popular"]), vec![1, 3]);
    assert_eq!(ids(&body["recommendations"]), vec![200]);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (server, _) = create_test_server();

    let response = server
        .get("/api/v1/movies/trending")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static("abc-123"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "abc-123");
}
