use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::search::SearchResults, error::AppResult, response::ApiResponse,
    routes::params::SearchQuery, services::search_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(global_search))
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("q" = String, Query, description = "At least 2 characters"),
        ("type" = Option<String>, Query, description = "blog, product, competition or all"),
        ("category" = Option<String>, Query, description = "Category slug, or competition type"),
        ("sort" = Option<String>, Query, description = "date (default) or relevance"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Hits per bucket, default 20"),
    ),
    responses(
        (status = 200, description = "Hits grouped by content type", body = ApiResponse<SearchResults>),
        (status = 400, description = "Query too short or unknown type/sort"),
    ),
    tag = "Search"
)]
pub async fn global_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<SearchResults>>> {
    let resp = search_service::global_search(&state, query).await?;
    Ok(Json(resp))
}
