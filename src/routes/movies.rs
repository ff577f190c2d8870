use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{image_url, ImageSize, Movie, MovieDetails, MovieId, TrendingWindow},
    routes::AppState,
};

/// Movie as rendered to clients, with resolved image URLs
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    #[serde(flatten)]
    pub movie: Movie,
    pub poster_url: String,
    pub backdrop_url: String,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            poster_url: image_url(movie.poster_path.as_deref(), ImageSize::W500),
            backdrop_url: image_url(movie.backdrop_path.as_deref(), ImageSize::Original),
            movie,
        }
    }
}

/// Renders a list of movies for a response body
pub fn to_responses(movies: Vec<Movie>) -> Vec<MovieResponse> {
    movies.into_iter().map(MovieResponse::from).collect()
}

#[derive(Debug, Serialize)]
pub struct MovieDetailsResponse {
    #[serde(flatten)]
    pub details: MovieDetails,
    pub poster_url: String,
    pub backdrop_url: String,
}

impl From<MovieDetails> for MovieDetailsResponse {
    fn from(details: MovieDetails) -> Self {
        Self {
            poster_url: image_url(details.movie.poster_path.as_deref(), ImageSize::W500),
            backdrop_url: image_url(
                details.movie.backdrop_path.as_deref(),
                ImageSize::Original,
            ),
            details,
        }
    }
}

/// Rejects ids TMDB can never have issued
pub fn validate_movie_id(movie_id: MovieId) -> AppResult<MovieId> {
    if movie_id <= 0 {
        return Err(AppError::InvalidInput("Invalid movie ID".to_string()));
    }
    Ok(movie_id)
}

/// Handler for the movie details endpoint
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<MovieDetailsResponse>> {
    let movie_id = validate_movie_id(movie_id)?;
    let details = state.catalog.get_movie_details(movie_id).await?;
    Ok(Json(details.into()))
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    window: TrendingWindow,
}

/// Handler for the trending list
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let movies = state.catalog.trending(params.window).await?;
    Ok(Json(to_responses(movies)))
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    page: Option<u32>,
}

/// Handler for the popular list
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let page = params.page.unwrap_or(1).max(1);
    let movies = state.catalog.popular(page).await?;
    Ok(Json(to_responses(movies)))
}
