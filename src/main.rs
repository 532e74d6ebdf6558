use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Request, Response, StatusCode, Uri},
    routing::get,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use asb_ban_api::{
    cache::{CacheStore, NoopCache, RedisCache},
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    mailer::build_mailer,
    push::{PushSender, WebPushSender},
    response::ApiResponse,
    routes::{create_api_router, doc::scalar_docs, health},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,asb_ban_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(pool);

    let state = AppState {
        orm,
        cache: connect_cache(&config).await,
        mailer: build_mailer(&config.email)?,
        push: build_push(&config),
        config: Arc::new(config.clone()),
    };

    let api_router = create_api_router();
    let concurrency_limit_layer = ConcurrencyLimitLayer::new(100);

    let cors_layer = CorsLayer::new()
        .allow_origin(config.frontend_url.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "request started"
            );
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_router)
        .merge(scalar_docs())
        .fallback(not_found)
        .layer(trace_layer)
        .layer(cors_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(concurrency_limit_layer)
        .with_state(state);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}

/// Redis when configured and reachable; otherwise run uncached.
async fn connect_cache(config: &AppConfig) -> Arc<dyn CacheStore> {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::info!("REDIS_URL not set, caching disabled");
        return Arc::new(NoopCache);
    };
    match RedisCache::connect(url).await {
        Ok(cache) => {
            tracing::info!("connected to redis");
            Arc::new(cache)
        }
        Err(err) => {
            tracing::warn!(error = %err, "redis unavailable, caching disabled");
            Arc::new(NoopCache)
        }
    }
}

fn build_push(config: &AppConfig) -> Option<Arc<dyn PushSender>> {
    let vapid = config.vapid.as_ref()?;
    match WebPushSender::new(vapid) {
        Ok(sender) => Some(Arc::new(sender)),
        Err(err) => {
            tracing::warn!(error = %err, "web push client unavailable, push disabled");
            None
        }
    }
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<()>>) {
    tracing::debug!(path = uri.path(), "no route");
    (StatusCode::NOT_FOUND, Json(ApiResponse::failure("Not Found")))
}
