use crate::{error::AppResult, models::SearchResults, services::providers::MovieCatalog};

/// Service function for movie search
///
/// Pages below 1 are clamped to the first page. Blank queries never reach the catalog.
pub async fn search_movies(
    catalog: &dyn MovieCatalog,
    query: &str,
    page: u32,
) -> AppResult<SearchResults> {
    if query.trim().is_empty() {
        return Ok(SearchResults::empty());
    }

    catalog.search(query.trim(), page.max(1)).await
}
