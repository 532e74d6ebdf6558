mod common;

use asb_ban_api::{
    dto::{
        competitions::{AddResultRequest, CreateCompetitionRequest, UpdateCompetitionRequest},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    entity::{CompetitionResults, Products},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::ProductQuery,
    services::{competition_service, product_service},
    state::AppState,
};
use chrono::NaiveDate;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use common::{as_admin, as_user, insert_product_category, insert_user, setup};

fn product(name: &str, category_id: Option<Uuid>) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: Some("چرم طبیعی".to_string()),
        price: 4_500_000,
        stock_quantity: 3,
        is_active: Some(true),
        category_id,
    }
}

fn competition(title: &str, start: NaiveDate) -> CreateCompetitionRequest {
    CreateCompetitionRequest {
        title: title.to_string(),
        description: None,
        competition_type: "dressage".to_string(),
        location: Some("اصفهان".to_string()),
        start_date: start,
        end_date: start.succ_opt(),
        registration_deadline: None,
        prize_info: None,
        image_url: None,
        is_international: Some(false),
        is_published: Some(true),
    }
}

fn result(position: i32, participant: &str) -> AddResultRequest {
    AddResultRequest {
        position,
        participant_name: participant.to_string(),
        horse_name: Some("رخش".to_string()),
        score: Some(71.5),
        notes: None,
    }
}

async fn create_competition(state: &AppState, admin: &AuthUser, title: &str) -> anyhow::Result<Uuid> {
    let start = NaiveDate::from_ymd_opt(2027, 4, 10).expect("date");
    let created = competition_service::create_competition(state, admin, competition(title, start))
        .await?
        .data
        .expect("competition");
    Ok(created.id)
}

#[tokio::test]
async fn concurrent_creates_of_one_product_name_yield_a_single_row() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = as_admin(insert_user(&app.state, "admin@example.com").await?);

    let (first, second) = tokio::join!(
        product_service::create_product(&app.state, &admin, product("Dressage Saddle", None)),
        product_service::create_product(&app.state, &admin, product("dressage saddle", None)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(msg)) if msg == "Product with this name already exists"))
    );
    assert_eq!(Products::find().count(&app.state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn products_filter_by_category() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = as_admin(insert_user(&app.state, "admin@example.com").await?);
    let tack = insert_product_category(&app.state, "Tack", "tack").await?;
    let feed = insert_product_category(&app.state, "Feed", "feed").await?;

    product_service::create_product(&app.state, &admin, product("Bridle", Some(tack))).await?;
    product_service::create_product(&app.state, &admin, product("Girth", Some(tack))).await?;
    product_service::create_product(&app.state, &admin, product("Oats", Some(feed))).await?;
    product_service::create_product(&app.state, &admin, product("Hoof Pick", None)).await?;

    let resp = product_service::list_products(
        &app.state,
        ProductQuery {
            category_id: Some(tack),
            ..Default::default()
        },
    )
    .await?;
    let meta = resp.meta.expect("meta");
    let items = resp.data.expect("products").items;
    assert_eq!(meta.total, Some(2));
    assert!(items.iter().all(|p| p.category_id == Some(tack)));

    let categories = product_service::list_categories(&app.state)
        .await?
        .data
        .expect("categories");
    let names: Vec<&str> = categories.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Feed", "Tack"]);

    let unknown = product_service::create_product(&app.state, &admin, product("Lead Rope", Some(Uuid::new_v4()))).await;
    assert!(matches!(unknown, Err(AppError::BadRequest(ref msg)) if msg == "Unknown product category"));

    let moved = product_service::list_products(&app.state, ProductQuery::default())
        .await?
        .data
        .expect("products")
        .items
        .into_iter()
        .find(|p| p.name == "Hoof Pick")
        .expect("hoof pick");
    let moved = product_service::update_product(
        &app.state,
        &admin,
        moved.id,
        UpdateProductRequest {
            category_id: Some(tack),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(moved.category_id, Some(tack));
    Ok(())
}

#[tokio::test]
async fn competition_update_reslugs_and_clears_cache() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin_id = insert_user(&app.state, "admin@example.com").await?;
    let rider = insert_user(&app.state, "rider@example.com").await?;
    let admin = as_admin(admin_id);

    let id = create_competition(&app.state, &admin, "جام بهار").await?;
    create_competition(&app.state, &admin, "جام تابستان").await?;

    let cached = competition_service::get_competition(&app.state, "جام-بهار")
        .await?
        .data
        .expect("competition");
    assert_eq!(cached.id, id);
    assert!(app.cache.contains("competitions:slug:جام-بهار"));

    let forbidden = competition_service::update_competition(
        &app.state,
        &as_user(rider),
        id,
        UpdateCompetitionRequest {
            location: Some("شیراز".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let taken = competition_service::update_competition(
        &app.state,
        &admin,
        id,
        UpdateCompetitionRequest {
            title: Some("جام تابستان".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    let empty =
        competition_service::update_competition(&app.state, &admin, id, UpdateCompetitionRequest::default()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(ref msg)) if msg == "No fields to update"));

    let backwards = competition_service::update_competition(
        &app.state,
        &admin,
        id,
        UpdateCompetitionRequest {
            end_date: NaiveDate::from_ymd_opt(2027, 4, 1),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(backwards, Err(AppError::BadRequest(_))));

    let renamed = competition_service::update_competition(
        &app.state,
        &admin,
        id,
        UpdateCompetitionRequest {
            title: Some("جام نوروز".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("competition");
    assert_eq!(renamed.slug, "جام-نوروز");
    assert!(!app.cache.contains("competitions:slug:جام-بهار"));

    let gone = competition_service::get_competition(&app.state, "جام-بهار").await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    let found = competition_service::get_competition(&app.state, "جام-نوروز")
        .await?
        .data
        .expect("competition");
    assert_eq!(found.id, id);
    Ok(())
}

#[tokio::test]
async fn results_are_ranked_and_removed_with_their_competition() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin_id = insert_user(&app.state, "admin@example.com").await?;
    let rider = insert_user(&app.state, "rider@example.com").await?;
    let admin = as_admin(admin_id);
    let id = create_competition(&app.state, &admin, "جام درساژ").await?;

    competition_service::add_result(&app.state, &admin, id, result(2, "مریم")).await?;
    competition_service::add_result(&app.state, &admin, id, result(1, "سارا")).await?;
    competition_service::add_result(&app.state, &admin, id, result(3, "علی")).await?;

    let zero = competition_service::add_result(&app.state, &admin, id, result(0, "رضا")).await;
    assert!(matches!(zero, Err(AppError::BadRequest(ref msg)) if msg == "Position must be at least 1"));
    let blank = competition_service::add_result(&app.state, &admin, id, result(4, "  ")).await;
    assert!(matches!(blank, Err(AppError::BadRequest(ref msg)) if msg == "Participant name is required"));
    let forbidden = competition_service::add_result(&app.state, &as_user(rider), id, result(4, "رضا")).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));
    let unknown = competition_service::add_result(&app.state, &admin, Uuid::new_v4(), result(1, "رضا")).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let standings = competition_service::list_results(&app.state, id)
        .await?
        .data
        .expect("results");
    let order: Vec<(i32, &str)> = standings
        .items
        .iter()
        .map(|r| (r.position, r.participant_name.as_str()))
        .collect();
    assert_eq!(order, vec![(1, "سارا"), (2, "مریم"), (3, "علی")]);

    let denied = competition_service::delete_competition(&app.state, &as_user(rider), id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    competition_service::delete_competition(&app.state, &admin, id).await?;
    assert_eq!(CompetitionResults::find().count(&app.state.orm).await?, 0);

    let after = competition_service::list_results(&app.state, id).await;
    assert!(matches!(after, Err(AppError::NotFound(_))));
    Ok(())
}
