use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        CategoryList,
        blog::{CreatePostRequest, PostList, UpdatePostRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::BlogPost,
    response::ApiResponse,
    routes::params::{BlogSearchQuery, PostQuery},
    services::blog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/search", get(search_posts))
        // GET takes a slug, PUT and DELETE an id
        .route(
            "/posts/{slug}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/categories", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category_id" = Option<Uuid>, Query, description = "Only posts in this category"),
    ),
    responses(
        (status = 200, description = "Published posts, newest first", body = ApiResponse<PostList>)
    ),
    tag = "Blog"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<ApiResponse<PostList>>> {
    let resp = blog_service::list_posts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts/search",
    params(("q" = String, Query, description = "Matched against title, body and excerpt")),
    responses(
        (status = 200, description = "Up to 20 matching posts", body = ApiResponse<PostList>),
        (status = 400, description = "Search query is required"),
    ),
    tag = "Blog"
)]
pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogSearchQuery>,
) -> AppResult<Json<ApiResponse<PostList>>> {
    let resp = blog_service::search_posts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Published post", body = ApiResponse<BlogPost>),
        (status = 404, description = "Post not found"),
    ),
    tag = "Blog"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::get_post(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/blog/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<BlogPost>),
        (status = 400, description = "Invalid post"),
        (status = 403, description = "Admins and authors only"),
        (status = 409, description = "Post with this title already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BlogPost>>)> {
    let resp = blog_service::create_post(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/blog/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<BlogPost>),
        (status = 400, description = "Invalid update"),
        (status = 403, description = "Admins and authors only"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Post with this title already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::update_post(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/blog/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Post not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = blog_service::delete_post(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/blog/categories",
    responses(
        (status = 200, description = "Blog categories by name", body = ApiResponse<CategoryList>)
    ),
    tag = "Blog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = blog_service::list_categories(&state).await?;
    Ok(Json(resp))
}
