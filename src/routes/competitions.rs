use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::competitions::{
        AddResultRequest, CompetitionList, CreateCompetitionRequest, ResultList,
        UpdateCompetitionRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Competition, CompetitionResult},
    response::ApiResponse,
    routes::params::CompetitionQuery,
    services::competition_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_competitions).post(create_competition))
        // GET takes a slug, everything else an id
        .route(
            "/{slug}",
            get(get_competition)
                .put(update_competition)
                .delete(delete_competition),
        )
        .route("/{slug}/results", get(list_results).post(add_result))
}

#[utoipa::path(
    get,
    path = "/api/competitions",
    params(
        ("competition_type" = Option<String>, Query, description = "Competition type"),
        ("is_international" = Option<bool>, Query, description = "International events only"),
        ("start_date" = Option<String>, Query, description = "Earliest start date, YYYY-MM-DD"),
        ("end_date" = Option<String>, Query, description = "Latest end date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Published competitions by start date", body = ApiResponse<CompetitionList>)
    ),
    tag = "Competitions"
)]
pub async fn list_competitions(
    State(state): State<AppState>,
    Query(query): Query<CompetitionQuery>,
) -> AppResult<Json<ApiResponse<CompetitionList>>> {
    let resp = competition_service::list_competitions(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/competitions/{slug}",
    params(("slug" = String, Path, description = "Competition slug")),
    responses(
        (status = 200, description = "Competition", body = ApiResponse<Competition>),
        (status = 404, description = "Competition not found"),
    ),
    tag = "Competitions"
)]
pub async fn get_competition(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Competition>>> {
    let resp = competition_service::get_competition(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/competitions",
    request_body = CreateCompetitionRequest,
    responses(
        (status = 201, description = "Competition created", body = ApiResponse<Competition>),
        (status = 400, description = "Invalid competition"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Competition with this title already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Competitions"
)]
pub async fn create_competition(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCompetitionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Competition>>)> {
    let resp = competition_service::create_competition(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/competitions/{id}",
    params(("id" = Uuid, Path, description = "Competition ID")),
    request_body = UpdateCompetitionRequest,
    responses(
        (status = 200, description = "Competition updated", body = ApiResponse<Competition>),
        (status = 400, description = "Invalid update"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Competition not found"),
        (status = 409, description = "Competition with this title already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Competitions"
)]
pub async fn update_competition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompetitionRequest>,
) -> AppResult<Json<ApiResponse<Competition>>> {
    let resp = competition_service::update_competition(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/competitions/{id}",
    params(("id" = Uuid, Path, description = "Competition ID")),
    responses(
        (status = 200, description = "Competition and its results deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Competition not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Competitions"
)]
pub async fn delete_competition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = competition_service::delete_competition(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}/results",
    params(("id" = Uuid, Path, description = "Competition ID")),
    responses(
        (status = 200, description = "Results by position", body = ApiResponse<ResultList>),
        (status = 404, description = "Competition not found"),
    ),
    tag = "Competitions"
)]
pub async fn list_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ResultList>>> {
    let resp = competition_service::list_results(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/results",
    params(("id" = Uuid, Path, description = "Competition ID")),
    request_body = AddResultRequest,
    responses(
        (status = 201, description = "Result added", body = ApiResponse<CompetitionResult>),
        (status = 400, description = "Invalid result"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Competition not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Competitions"
)]
pub async fn add_result(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddResultRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CompetitionResult>>)> {
    let resp = competition_service::add_result(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
