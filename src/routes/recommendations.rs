use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::UserId,
    routes::{
        movies::{to_responses, MovieResponse},
        AppState,
    },
    services::{feed::home_feed, recommendations::UserRecommendations},
};

const EMPTY_HISTORY_MESSAGE: &str = "Watch some movies to get personalized recommendations!";

/// Which recommendation context the caller renders
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Home,
    #[default]
    Page,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    profile: ProfileKind,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<MovieResponse>,
    pub message: Option<String>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let profile = match params.profile {
        ProfileKind::Home => state.home_profile,
        ProfileKind::Page => state.page_profile,
    };

    tracing::info!(
        request_id = %request_id,
        user_id,
        recent_count = profile.recent_count,
        limit = profile.limit,
        "Processing recommendation request"
    );

    let outcome = state
        .engine
        .recommend_for_user(state.history.as_ref(), user_id, &profile)
        .await?;

    let response = match outcome {
        UserRecommendations::NoHistory => RecommendationResponse {
            recommendations: Vec::new(),
            message: Some(EMPTY_HISTORY_MESSAGE.to_string()),
        },
        UserRecommendations::Ranked(movies) => {
            tracing::info!(
                request_id = %request_id,
                user_id,
                returned = movies.len(),
                "Recommendations completed"
            );

            RecommendationResponse {
                recommendations: to_responses(movies),
                message: None,
            }
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub trending: Vec<MovieResponse>,
    pub popular: Vec<MovieResponse>,
    pub recommendations: Vec<MovieResponse>,
}

/// Handler for a user's home feed
pub async fn home(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Json<HomeResponse> {
    let feed = home_feed(
        state.catalog.as_ref(),
        &state.engine,
        state.history.as_ref(),
        user_id,
        &state.home_profile,
    )
    .await;

    Json(HomeResponse {
        trending: to_responses(feed.trending),
        popular: to_responses(feed.popular),
        recommendations: to_responses(feed.recommendations),
    })
}
