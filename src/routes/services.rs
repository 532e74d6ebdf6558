use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::services::{
        BookingList, CreateBookingRequest, CreateReviewRequest, RegisterTransporterRequest,
        RegisterVeterinarianRequest, ReviewList, TransporterList, UpdateBookingStatusRequest,
        UpdateTransporterRequest, UpdateVeterinarianRequest, VeterinarianList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Booking, Review, Transporter, Veterinarian},
    response::ApiResponse,
    routes::params::ProviderQuery,
    services::{booking_service, provider_service, review_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/veterinarians",
            get(list_veterinarians).post(register_veterinarian),
        )
        .route(
            "/veterinarians/{id}",
            get(get_veterinarian).put(update_veterinarian),
        )
        .route(
            "/transporters",
            get(list_transporters).post(register_transporter),
        )
        .route(
            "/transporters/{id}",
            get(get_transporter).put(update_transporter),
        )
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}/status", put(update_booking_status))
        .route("/reviews", post(create_review))
        .route("/reviews/{service_type}/{provider_id}", get(list_reviews))
}

#[utoipa::path(
    get,
    path = "/api/services/veterinarians",
    params(
        ("latitude" = Option<f64>, Query, description = "Origin latitude"),
        ("longitude" = Option<f64>, Query, description = "Origin longitude"),
        ("radius" = Option<f64>, Query, description = "Radius in km, default 50"),
        ("region" = Option<String>, Query, description = "Region filter, ignored with an origin"),
        ("specialization" = Option<String>, Query, description = "Specialization filter"),
    ),
    responses(
        (status = 200, description = "Active veterinarians, nearest or best rated first", body = ApiResponse<VeterinarianList>)
    ),
    tag = "Services"
)]
pub async fn list_veterinarians(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> AppResult<Json<ApiResponse<VeterinarianList>>> {
    let resp = provider_service::list_veterinarians(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/veterinarians/{id}",
    params(("id" = Uuid, Path, description = "Veterinarian ID")),
    responses(
        (status = 200, description = "Veterinarian", body = ApiResponse<Veterinarian>),
        (status = 404, description = "Veterinarian not found"),
    ),
    tag = "Services"
)]
pub async fn get_veterinarian(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Veterinarian>>> {
    let resp = provider_service::get_veterinarian(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services/veterinarians",
    request_body = RegisterVeterinarianRequest,
    responses(
        (status = 201, description = "Registered", body = ApiResponse<Veterinarian>),
        (status = 400, description = "Invalid registration"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn register_veterinarian(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RegisterVeterinarianRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Veterinarian>>)> {
    let resp = provider_service::register_veterinarian(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/services/veterinarians/{id}",
    params(("id" = Uuid, Path, description = "Veterinarian ID")),
    request_body = UpdateVeterinarianRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Veterinarian>),
        (status = 400, description = "No fields to update"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Veterinarian not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_veterinarian(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVeterinarianRequest>,
) -> AppResult<Json<ApiResponse<Veterinarian>>> {
    let resp = provider_service::update_veterinarian(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/transporters",
    params(
        ("latitude" = Option<f64>, Query, description = "Origin latitude"),
        ("longitude" = Option<f64>, Query, description = "Origin longitude"),
        ("radius" = Option<f64>, Query, description = "Radius in km, default 50"),
        ("region" = Option<String>, Query, description = "Region filter, ignored with an origin"),
    ),
    responses(
        (status = 200, description = "Active transporters, nearest or best rated first", body = ApiResponse<TransporterList>)
    ),
    tag = "Services"
)]
pub async fn list_transporters(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> AppResult<Json<ApiResponse<TransporterList>>> {
    let resp = provider_service::list_transporters(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/transporters/{id}",
    params(("id" = Uuid, Path, description = "Transporter ID")),
    responses(
        (status = 200, description = "Transporter", body = ApiResponse<Transporter>),
        (status = 404, description = "Transporter not found"),
    ),
    tag = "Services"
)]
pub async fn get_transporter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Transporter>>> {
    let resp = provider_service::get_transporter(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services/transporters",
    request_body = RegisterTransporterRequest,
    responses(
        (status = 201, description = "Registered", body = ApiResponse<Transporter>),
        (status = 400, description = "Invalid registration"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn register_transporter(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RegisterTransporterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Transporter>>)> {
    let resp = provider_service::register_transporter(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/services/transporters/{id}",
    params(("id" = Uuid, Path, description = "Transporter ID")),
    request_body = UpdateTransporterRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Transporter>),
        (status = 400, description = "No fields to update"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Transporter not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_transporter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransporterRequest>,
) -> AppResult<Json<ApiResponse<Transporter>>> {
    let resp = provider_service::update_transporter(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<Booking>),
        (status = 400, description = "Invalid service type"),
        (status = 404, description = "Service provider not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Booking>>)> {
    let resp = booking_service::create_booking(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/services/bookings",
    responses(
        (status = 200, description = "Bookings of the current user", body = ApiResponse<BookingList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/services/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Booking>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Booking not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::update_booking_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Rating out of range or booking mismatch"),
        (status = 404, description = "Booking not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = review_service::create_review(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/services/reviews/{service_type}/{provider_id}",
    params(
        ("service_type" = String, Path, description = "veterinarian or transporter"),
        ("provider_id" = Uuid, Path, description = "Provider ID"),
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<ReviewList>),
        (status = 400, description = "Invalid service type"),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path((service_type, provider_id)): Path<(String, Uuid)>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state, &service_type, provider_id).await?;
    Ok(Json(resp))
}
