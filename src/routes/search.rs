use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    middleware::request_id::RequestId,
    routes::{
        movies::{to_responses, MovieResponse},
        AppState,
    },
    services::search::search_movies,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    page: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub movies: Vec<MovieResponse>,
    pub total_pages: u32,
    pub total_results: u32,
    pub current_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    fn empty(query: String) -> Self {
        Self {
            query,
            movies: Vec::new(),
            total_pages: 0,
            total_results: 0,
            current_page: 1,
            error: None,
        }
    }
}

/// Handler for movie search
///
/// Always answers with the same body shape; an upstream failure is reported as a
/// 500 carrying an empty result and an `error` message.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> Response {
    if params.q.trim().is_empty() {
        return Json(SearchResponse::empty(String::new())).into_response();
    }

    let page = params.page.unwrap_or(1).max(1);

    tracing::info!(
        request_id = %request_id,
        query = %params.q,
        page,
        "Processing search request"
    );

    match search_movies(state.catalog.as_ref(), &params.q, page).await {
        Ok(results) => Json(SearchResponse {
            query: params.q,
            movies: to_responses(results.results),
            total_pages: results.total_pages,
            total_results: results.total_results,
            current_page: page,
            error: None,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Search failed");
            let mut body = SearchResponse::empty(params.q);
            body.error = Some("Failed to search movies".to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
