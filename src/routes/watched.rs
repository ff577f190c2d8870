use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MovieId, UserId},
    routes::{
        movies::{to_responses, validate_movie_id, MovieResponse},
        AppState,
    },
    services::watched::list_watched_movies,
};

#[derive(Debug, Deserialize)]
pub struct WatchedQuery {
    q: Option<String>,
}

/// Handler listing a user's watched movies, most recent first
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Query(params): Query<WatchedQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let movies = list_watched_movies(
        state.history.as_ref(),
        state.catalog.as_ref(),
        user_id,
        params.q.as_deref(),
        state.upstream_timeout,
    )
    .await?;

    Ok(Json(to_responses(movies)))
}

#[derive(Debug, Serialize)]
pub struct WatchStatusResponse {
    pub movie_id: MovieId,
    pub watched: bool,
    pub watched_at: Option<DateTime<Utc>>,
}

/// Handler reporting whether a user watched a movie
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(UserId, MovieId)>,
) -> AppResult<Json<WatchStatusResponse>> {
    let movie_id = validate_movie_id(movie_id)?;
    let status = state.history.watch_status(user_id, movie_id).await?;

    Ok(Json(WatchStatusResponse {
        movie_id,
        watched: status.is_watched(),
        watched_at: status.watched_at(),
    }))
}

/// Handler marking a movie as watched; repeating it changes nothing
pub async fn mark(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(UserId, MovieId)>,
) -> AppResult<StatusCode> {
    let movie_id = validate_movie_id(movie_id)?;
    state.history.mark_watched(user_id, movie_id).await?;

    tracing::info!(user_id, movie_id, "Movie marked as watched");

    Ok(StatusCode::NO_CONTENT)
}

/// Handler removing a movie from the watched list; unknown movies are ignored
pub async fn unmark(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(UserId, MovieId)>,
) -> AppResult<StatusCode> {
    let movie_id = validate_movie_id(movie_id)?;
    state.history.unmark(user_id, movie_id).await?;

    tracing::info!(user_id, movie_id, "Movie unmarked as watched");

    Ok(StatusCode::NO_CONTENT)
}
