mod common;

use asb_ban_api::{
    dto::{
        blog::{CreatePostRequest, UpdatePostRequest},
        competitions::CreateCompetitionRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::BlogPost,
    routes::params::{BlogSearchQuery, PostQuery, SearchQuery},
    services::{blog_service, competition_service, search_service},
    state::AppState,
};
use chrono::NaiveDate;
use uuid::Uuid;

use common::{as_admin, as_role, as_user, insert_blog_category, insert_product, insert_user, setup};

fn post(title: &str, content: &str, category_id: Option<Uuid>) -> CreatePostRequest {
    CreatePostRequest {
        title: title.to_string(),
        excerpt: None,
        content: content.to_string(),
        featured_image: None,
        category_id,
        is_published: None,
    }
}

async fn publish(state: &AppState, author: &AuthUser, request: CreatePostRequest) -> anyhow::Result<BlogPost> {
    Ok(blog_service::create_post(state, author, request)
        .await?
        .data
        .expect("post"))
}

fn search(q: &str) -> SearchQuery {
    SearchQuery {
        q: Some(q.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn authors_write_posts_and_reads_are_cached() -> anyhow::Result<()> {
    let app = setup().await?;
    let author = as_role(insert_user(&app.state, "author@example.com").await?, "author");
    let rider = as_user(insert_user(&app.state, "rider@example.com").await?);
    let admin = as_admin(insert_user(&app.state, "admin@example.com").await?);

    let forbidden = blog_service::create_post(&app.state, &rider, post("Hoof care", "Trim often.", None)).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let created = publish(&app.state, &author, post("Hoof care", "Trim every six weeks.", None)).await?;
    assert_eq!(created.slug, "hoof-care");
    assert!(created.published_at.is_some());
    assert_eq!(created.author_name.as_deref(), Some("Rider author@example.com"));

    let duplicate = blog_service::create_post(&app.state, &author, post("Hoof  Care!", "Again.", None)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    let blank = blog_service::create_post(&app.state, &author, post("Empty", "  ", None)).await;
    assert!(matches!(blank, Err(AppError::BadRequest(ref msg)) if msg == "Title and content are required"));

    let read = blog_service::get_post(&app.state, "hoof-care").await?.data.expect("post");
    assert_eq!(read.views_count, 1);
    assert!(app.cache.contains("blog_post:hoof-care"));

    let renamed = blog_service::update_post(
        &app.state,
        &author,
        created.id,
        UpdatePostRequest {
            title: Some("Hoof care in winter".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("post");
    assert_eq!(renamed.slug, "hoof-care-in-winter");
    assert!(!app.cache.contains("blog_post:hoof-care"));

    let old = blog_service::get_post(&app.state, "hoof-care").await;
    assert!(matches!(old, Err(AppError::NotFound(_))));
    blog_service::get_post(&app.state, "hoof-care-in-winter").await?;
    assert!(app.cache.contains("blog_post:hoof-care-in-winter"));

    let not_admin = blog_service::delete_post(&app.state, &author, created.id).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));
    blog_service::delete_post(&app.state, &admin, created.id).await?;
    assert!(!app.cache.contains("blog_post:hoof-care-in-winter"));
    let deleted = blog_service::get_post(&app.state, "hoof-care-in-winter").await;
    assert!(matches!(deleted, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn drafts_stay_hidden_until_published() -> anyhow::Result<()> {
    let app = setup().await?;
    let author = as_role(insert_user(&app.state, "author@example.com").await?, "author");
    let health = insert_blog_category(&app.state, "Health", "health").await?;
    let training = insert_blog_category(&app.state, "Training", "training").await?;

    publish(&app.state, &author, post("Colic signs", "Watch the flanks.", Some(health))).await?;
    publish(&app.state, &author, post("Lunging basics", "Start on a circle.", Some(training))).await?;
    let mut draft = post("Deworming plan", "Rotate products.", Some(health));
    draft.is_published = Some(false);
    let draft = publish(&app.state, &author, draft).await?;
    assert!(draft.published_at.is_none());

    let listed = blog_service::list_posts(&app.state, PostQuery::default()).await?;
    assert_eq!(listed.meta.expect("meta").total, Some(2));
    let hidden = blog_service::get_post(&app.state, "deworming-plan").await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));

    let in_health = blog_service::list_posts(
        &app.state,
        PostQuery {
            category_id: Some(health),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("posts");
    let titles: Vec<&str> = in_health.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Colic signs"]);
    assert_eq!(in_health.items[0].category_slug.as_deref(), Some("health"));

    let published = blog_service::update_post(
        &app.state,
        &author,
        draft.id,
        UpdatePostRequest {
            is_published: Some(true),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("post");
    assert!(published.published_at.is_some());
    blog_service::get_post(&app.state, "deworming-plan").await?;

    let categories = blog_service::list_categories(&app.state).await?.data.expect("categories");
    let names: Vec<&str> = categories.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Health", "Training"]);
    Ok(())
}

#[tokio::test]
async fn blog_search_matches_title_body_and_excerpt() -> anyhow::Result<()> {
    let app = setup().await?;
    let author = as_role(insert_user(&app.state, "author@example.com").await?, "author");

    publish(&app.state, &author, post("Feeding in winter", "More hay, less grain.", None)).await?;
    let mut with_excerpt = post("Stable routines", "Muck out daily.", None);
    with_excerpt.excerpt = Some("Why HAY matters".into());
    publish(&app.state, &author, with_excerpt).await?;
    publish(&app.state, &author, post("Show nerves", "Breathe.", None)).await?;

    let empty = blog_service::search_posts(&app.state, BlogSearchQuery { q: Some("  ".into()) }).await;
    assert!(matches!(empty, Err(AppError::BadRequest(ref msg)) if msg == "Search query is required"));

    let hits = blog_service::search_posts(&app.state, BlogSearchQuery { q: Some("hay".into()) })
        .await?
        .data
        .expect("posts");
    let mut titles: Vec<&str> = hits.items.iter().map(|p| p.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Feeding in winter", "Stable routines"]);
    Ok(())
}

#[tokio::test]
async fn global_search_spans_blog_products_and_competitions() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = as_admin(insert_user(&app.state, "admin@example.com").await?);
    let care = insert_blog_category(&app.state, "Care", "care").await?;

    publish(&app.state, &admin, post("Saddle care basics", "Clean the leather.", Some(care))).await?;
    publish(&app.state, &admin, post("Winter riding", "Check the saddle fit twice.", None)).await?;
    let mut draft = post("Saddle secrets", "Unreleased.", None);
    draft.is_published = Some(false);
    publish(&app.state, &admin, draft).await?;

    insert_product(&app.state, "Saddle pad", 900_000, 5).await?;
    insert_product(&app.state, "Lead rope", 150_000, 5).await?;

    let start = NaiveDate::from_ymd_opt(2027, 6, 1).expect("date");
    for (title, kind) in [("Saddle Cup", "show_jumping"), ("Dressage Saddle Cup", "dressage")] {
        competition_service::create_competition(
            &app.state,
            &admin,
            CreateCompetitionRequest {
                title: title.to_string(),
                description: None,
                competition_type: kind.to_string(),
                location: None,
                start_date: start,
                end_date: None,
                registration_deadline: None,
                prize_info: None,
                image_url: None,
                is_international: None,
                is_published: Some(true),
            },
        )
        .await?;
    }

    let short = search_service::global_search(&app.state, search("s")).await;
    assert!(matches!(short, Err(AppError::BadRequest(ref msg)) if msg == "Search query must be at least 2 characters"));
    let mut bad_type = search("saddle");
    bad_type.scope = Some("forum".into());
    let bad_type = search_service::global_search(&app.state, bad_type).await;
    assert!(matches!(bad_type, Err(AppError::BadRequest(_))));

    let mut by_relevance = search("saddle");
    by_relevance.sort = Some("relevance".into());
    let everything = search_service::global_search(&app.state, by_relevance)
        .await?
        .data
        .expect("results");
    assert_eq!(everything.query, "saddle");
    assert_eq!(everything.results.blog.len(), 2);
    assert_eq!(everything.results.blog[0].title, "Saddle care basics");
    assert_eq!(everything.results.products.len(), 1);
    assert_eq!(everything.results.competitions.len(), 2);
    assert_eq!(everything.total, 5);

    let mut products_only = search("saddle");
    products_only.scope = Some("product".into());
    let products_only = search_service::global_search(&app.state, products_only)
        .await?
        .data
        .expect("results");
    assert!(products_only.results.blog.is_empty());
    assert!(products_only.results.competitions.is_empty());
    assert_eq!(products_only.total, 1);

    let mut dressage = search("cup");
    dressage.scope = Some("competition".into());
    dressage.category = Some("dressage".into());
    let dressage = search_service::global_search(&app.state, dressage)
        .await?
        .data
        .expect("results");
    let titles: Vec<&str> = dressage.results.competitions.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Dressage Saddle Cup"]);

    let mut in_care = search("saddle");
    in_care.scope = Some("blog".into());
    in_care.category = Some("care".into());
    let in_care = search_service::global_search(&app.state, in_care)
        .await?
        .data
        .expect("results");
    assert_eq!(in_care.results.blog.len(), 1);
    assert_eq!(in_care.total, 1);
    Ok(())
}
