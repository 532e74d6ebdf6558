use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    cache::{get_json, set_json},
    dto::{
        CategoryList,
        blog::{CreatePostRequest, PostList, UpdatePostRequest},
    },
    entity::{
        BlogCategories, Users, blog_categories,
        blog_posts::{ActiveModel, Column, Entity as BlogPosts, Model as PostModel},
        users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_author},
    models::{BlogPost, BlogPostSummary, Category},
    response::{ApiResponse, Meta},
    routes::params::{BlogSearchQuery, PostQuery},
    services::{contains_ci, slugify, unique_conflict},
    state::AppState,
};

const POST_CACHE_TTL_SECS: u64 = 3600;
const POST_KEY_PREFIX: &str = "blog_post:";
const SEARCH_LIMIT: u64 = 20;
const DUPLICATE_POST: &str = "Post with this title already exists";

fn post_key(slug: &str) -> String {
    format!("{POST_KEY_PREFIX}{slug}")
}

pub async fn list_posts(state: &AppState, query: PostQuery) -> AppResult<ApiResponse<PostList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsPublished.eq(true));
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    let finder = newest_first(BlogPosts::find().filter(condition));
    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = hydrate(state, rows)
        .await?
        .into_iter()
        .map(BlogPostSummary::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Posts", PostList { items }, Some(meta)))
}

/// Published post by slug, read through the cache. A database read counts as
/// a view; cache hits do not.
pub async fn get_post(state: &AppState, slug: &str) -> AppResult<ApiResponse<BlogPost>> {
    let key = post_key(slug);
    if let Some(cached) = get_json::<BlogPost>(state.cache.as_ref(), &key).await {
        return Ok(ApiResponse::data(cached));
    }

    let post = BlogPosts::find()
        .filter(
            Condition::all()
                .add(Column::Slug.eq(slug))
                .add(Column::IsPublished.eq(true)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    BlogPosts::update_many()
        .col_expr(Column::ViewsCount, Expr::col(Column::ViewsCount).add(1))
        .filter(Column::Id.eq(post.id))
        .exec(&state.orm)
        .await?;

    let mut post = hydrate_one(state, post).await?;
    post.views_count += 1;

    set_json(state.cache.as_ref(), &key, &post, POST_CACHE_TTL_SECS).await;
    Ok(ApiResponse::data(post))
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_author(user)?;

    let title = payload.title.trim().to_string();
    if title.is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Title and content are required".into()));
    }
    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Title must contain letters or digits".into()));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
    }
    ensure_slug_free(state, &slug).await?;

    let now = Utc::now();
    let published = payload.is_published.unwrap_or(true);
    let post = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        slug: Set(slug),
        excerpt: Set(payload.excerpt),
        content: Set(payload.content),
        featured_image: Set(payload.featured_image),
        category_id: Set(payload.category_id),
        author_id: Set(user.user_id),
        is_published: Set(published),
        published_at: Set(published.then(|| now.into())),
        views_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| unique_conflict(err, DUPLICATE_POST))?;

    tracing::info!(post_id = %post.id, slug = %post.slug, "blog post created");

    Ok(ApiResponse::success(
        "Post created successfully",
        hydrate_one(state, post).await?,
        None,
    ))
}

pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_author(user)?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let existing = find_post(state, id).await?;
    let old_slug = existing.slug.clone();
    let now = Utc::now();

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(AppError::BadRequest("Title must contain letters or digits".into()));
        }
        if slug != old_slug {
            ensure_slug_free(state, &slug).await?;
        }
        active.title = Set(title);
        active.slug = Set(slug);
    }
    if let Some(content) = payload.content {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Title and content are required".into()));
        }
        active.content = Set(content);
    }
    if let Some(excerpt) = payload.excerpt {
        active.excerpt = Set(Some(excerpt));
    }
    if let Some(image) = payload.featured_image {
        active.featured_image = Set(Some(image));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(Some(category_id));
    }
    if let Some(published) = payload.is_published {
        active.is_published = Set(published);
        if published {
            active.published_at = Set(Some(now.into()));
        }
    }
    active.updated_at = Set(now.into());

    let post = active
        .update(&state.orm)
        .await
        .map_err(|err| unique_conflict(err, DUPLICATE_POST))?;

    state.cache.delete(&post_key(&old_slug)).await;
    if post.slug != old_slug {
        state.cache.delete(&post_key(&post.slug)).await;
    }

    Ok(ApiResponse::success(
        "Post updated successfully",
        hydrate_one(state, post).await?,
        None,
    ))
}

pub async fn delete_post(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;
    let post = find_post(state, id).await?;

    BlogPosts::delete_by_id(post.id).exec(&state.orm).await?;
    state.cache.delete(&post_key(&post.slug)).await;
    tracing::info!(post_id = %post.id, "blog post deleted");

    Ok(ApiResponse::message("Post deleted successfully"))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = BlogCategories::find()
        .order_by_asc(blog_categories::Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Category {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(ApiResponse::data(CategoryList { items }))
}

pub async fn search_posts(
    state: &AppState,
    query: BlogSearchQuery,
) -> AppResult<ApiResponse<PostList>> {
    let Some(needle) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Err(AppError::BadRequest("Search query is required".into()));
    };

    let items = search_published(state, needle, None, SEARCH_LIMIT, 0).await?;
    Ok(ApiResponse::data(PostList { items }))
}

/// Published posts whose title, body or excerpt contains `needle`, newest
/// first. `category_slug` narrows to one category; an unknown slug matches
/// nothing.
pub(crate) async fn search_published(
    state: &AppState,
    needle: &str,
    category_slug: Option<&str>,
    limit: u64,
    offset: u64,
) -> AppResult<Vec<BlogPostSummary>> {
    let mut condition = Condition::all().add(Column::IsPublished.eq(true)).add(
        Condition::any()
            .add(contains_ci(Column::Title, needle))
            .add(contains_ci(Column::Content, needle))
            .add(contains_ci(Column::Excerpt, needle)),
    );

    if let Some(slug) = category_slug {
        let category = BlogCategories::find()
            .filter(blog_categories::Column::Slug.eq(slug))
            .one(&state.orm)
            .await?;
        let Some(category) = category else {
            return Ok(Vec::new());
        };
        condition = condition.add(Column::CategoryId.eq(category.id));
    }

    let rows = newest_first(BlogPosts::find().filter(condition))
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?;

    Ok(hydrate(state, rows)
        .await?
        .into_iter()
        .map(BlogPostSummary::from)
        .collect())
}

fn newest_first(select: Select<BlogPosts>) -> Select<BlogPosts> {
    select
        .order_by_desc(Column::PublishedAt)
        .order_by_desc(Column::CreatedAt)
}

async fn find_post(state: &AppState, id: Uuid) -> AppResult<PostModel> {
    BlogPosts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

async fn ensure_slug_free(state: &AppState, slug: &str) -> AppResult<()> {
    let taken = BlogPosts::find()
        .filter(Column::Slug.eq(slug))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(DUPLICATE_POST.into()));
    }
    Ok(())
}

async fn ensure_category(state: &AppState, category_id: Uuid) -> AppResult<()> {
    BlogCategories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Unknown blog category".into()))
}

async fn hydrate_one(state: &AppState, post: PostModel) -> AppResult<BlogPost> {
    hydrate(state, vec![post])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

/// Attaches category and author names with one lookup per table.
async fn hydrate(state: &AppState, rows: Vec<PostModel>) -> AppResult<Vec<BlogPost>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let category_ids: Vec<Uuid> = rows.iter().filter_map(|p| p.category_id).collect();
    let author_ids: Vec<Uuid> = rows.iter().map(|p| p.author_id).collect();

    let categories: HashMap<Uuid, blog_categories::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        BlogCategories::find()
            .filter(blog_categories::Column::Id.is_in(category_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };
    let authors: HashMap<Uuid, String> = Users::find()
        .filter(users::Column::Id.is_in(author_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|post| {
            let category = post.category_id.and_then(|id| categories.get(&id));
            let author_name = authors.get(&post.author_id).cloned();
            post_from_entity(post, category, author_name)
        })
        .collect())
}

fn post_from_entity(
    model: PostModel,
    category: Option<&blog_categories::Model>,
    author_name: Option<String>,
) -> BlogPost {
    BlogPost {
        id: model.id,
        title: model.title,
        slug: model.slug,
        excerpt: model.excerpt,
        content: model.content,
        featured_image: model.featured_image,
        category_id: model.category_id,
        category_name: category.map(|c| c.name.clone()),
        category_slug: category.map(|c| c.slug.clone()),
        author_id: model.author_id,
        author_name,
        is_published: model.is_published,
        views_count: model.views_count,
        published_at: model.published_at.map(|at| at.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
