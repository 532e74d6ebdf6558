use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::{get, post},
};

use crate::{
    dto::push::{
        SentCount, SubscribeRequest, SubscriptionList, TestPushRequest, UnsubscribeRequest,
        VapidKey,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::PushSubscription,
    response::ApiResponse,
    services::push_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vapid-key", get(vapid_public_key))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/subscriptions", get(list_subscriptions))
        .route("/test", post(send_test))
}

#[utoipa::path(
    get,
    path = "/api/push/vapid-key",
    responses(
        (status = 200, description = "Public application server key", body = ApiResponse<VapidKey>),
        (status = 503, description = "Push notifications not configured"),
    ),
    tag = "Push"
)]
pub async fn vapid_public_key(State(state): State<AppState>) -> AppResult<Json<ApiResponse<VapidKey>>> {
    let resp = push_service::vapid_public_key(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/push/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscription stored", body = ApiResponse<PushSubscription>),
        (status = 400, description = "Invalid subscription object"),
    ),
    security(("bearer_auth" = [])),
    tag = "Push"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<PushSubscription>>> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let resp = push_service::subscribe(&state, &user, payload, user_agent).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/push/unsubscribe",
    request_body = UnsubscribeRequest,
    responses(
        (status = 200, description = "Subscription removed"),
        (status = 400, description = "Endpoint is required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Push"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UnsubscribeRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = push_service::unsubscribe(&state, &user, &payload.endpoint).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/push/subscriptions",
    responses(
        (status = 200, description = "Devices registered by the current user", body = ApiResponse<SubscriptionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Push"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    let resp = push_service::list_subscriptions(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/push/test",
    request_body = TestPushRequest,
    responses(
        (status = 200, description = "Test push sent", body = ApiResponse<SentCount>),
        (status = 400, description = "Title and message are required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Push"
)]
pub async fn send_test(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TestPushRequest>,
) -> AppResult<Json<ApiResponse<SentCount>>> {
    let resp = push_service::send_test(&state, &user, payload).await?;
    Ok(Json(resp))
}
