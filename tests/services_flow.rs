mod common;

use asb_ban_api::{
    dto::services::{
        CreateBookingRequest, CreateReviewRequest, RegisterVeterinarianRequest,
        UpdateBookingStatusRequest, UpdateVeterinarianRequest,
    },
    entity::{
        Notifications, ServiceBookings, ServiceReviews, Veterinarians,
        sea_orm_active_enums::BookingStatus,
    },
    error::AppError,
    routes::params::ProviderQuery,
    services::{booking_service, provider_service, review_service},
    state::AppState,
};
use chrono::{Duration, Utc};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use common::{
    VetSeed, as_admin, as_user, insert_transporter, insert_user, insert_vet, setup,
    setup_with_failing_mailer,
};

const TEHRAN: (f64, f64) = (35.6892, 51.3890);

async fn book_vet(state: &AppState, customer: Uuid, vet_id: Uuid) -> anyhow::Result<Uuid> {
    let booking = booking_service::create_booking(
        state,
        &as_user(customer),
        CreateBookingRequest {
            service_type: "veterinarian".into(),
            service_provider_id: vet_id,
            booking_date: Utc::now() + Duration::days(3),
            description: Some("معاینه سالانه".into()),
        },
    )
    .await?
    .data
    .expect("booking");
    Ok(booking.id)
}

fn unrated(name: &str) -> VetSeed<'_> {
    VetSeed {
        name,
        coordinates: None,
        rating: 0.0,
        total_reviews: 0,
    }
}

fn review(booking_id: Uuid, provider_id: Uuid, rating: i32) -> CreateReviewRequest {
    CreateReviewRequest {
        booking_id,
        service_provider_id: provider_id,
        service_type: "veterinarian".into(),
        rating,
        comment: Some("خوب".into()),
    }
}

#[tokio::test]
async fn review_rating_outside_one_to_five_is_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let vet = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "دکتر رضایی",
            coordinates: None,
            rating: 4.0,
            total_reviews: 1,
        },
    )
    .await?;
    let booking_id = book_vet(&app.state, customer, vet.id).await?;

    for rating in [0, 6] {
        let result =
            review_service::create_review(&app.state, &as_user(customer), review(booking_id, vet.id, rating))
                .await;
        assert!(
            matches!(result, Err(AppError::BadRequest(ref msg)) if msg == "Rating must be between 1 and 5"),
            "rating {rating} accepted"
        );
    }

    assert_eq!(ServiceReviews::find().count(&app.state.orm).await?, 0);
    let untouched = Veterinarians::find_by_id(vet.id)
        .one(&app.state.orm)
        .await?
        .expect("vet");
    assert_eq!(untouched.rating, 4.0);
    assert_eq!(untouched.total_reviews, 1);
    Ok(())
}

#[tokio::test]
async fn review_folds_into_running_average() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let vet = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "دکتر احمدی",
            coordinates: None,
            rating: 4.0,
            total_reviews: 1,
        },
    )
    .await?;
    let booking_id = book_vet(&app.state, customer, vet.id).await?;

    review_service::create_review(&app.state, &as_user(customer), review(booking_id, vet.id, 3)).await?;

    let updated = Veterinarians::find_by_id(vet.id)
        .one(&app.state.orm)
        .await?
        .expect("vet");
    assert!((updated.rating - 3.5).abs() < 1e-9);
    assert_eq!(updated.total_reviews, 2);

    let reviews = review_service::list_reviews(&app.state, "veterinarian", vet.id)
        .await?
        .data
        .expect("reviews");
    assert_eq!(reviews.items.len(), 1);
    assert_eq!(
        reviews.items[0].reviewer_name.as_deref(),
        Some("Rider rider@example.com")
    );
    Ok(())
}

#[tokio::test]
async fn review_requires_own_booking_for_the_same_provider() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let stranger = insert_user(&app.state, "stranger@example.com").await?;
    let booked = insert_vet(&app.state, owner, unrated("دکتر الف")).await?;
    let other = insert_vet(&app.state, owner, unrated("دکتر ب")).await?;
    let booking_id = book_vet(&app.state, customer, booked.id).await?;

    let not_mine =
        review_service::create_review(&app.state, &as_user(stranger), review(booking_id, booked.id, 5)).await;
    assert!(matches!(not_mine, Err(AppError::NotFound(_))));

    let wrong_provider =
        review_service::create_review(&app.state, &as_user(customer), review(booking_id, other.id, 5)).await;
    assert!(matches!(wrong_provider, Err(AppError::BadRequest(_))));

    assert_eq!(ServiceReviews::find().count(&app.state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn proximity_search_filters_by_radius_and_sorts_by_distance() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vets@example.com").await?;
    let near = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "near",
            coordinates: Some((35.70, 51.40)),
            rating: 3.0,
            total_reviews: 2,
        },
    )
    .await?;
    let karaj = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "karaj",
            coordinates: Some((35.84, 50.94)),
            rating: 5.0,
            total_reviews: 1,
        },
    )
    .await?;
    let isfahan = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "isfahan",
            coordinates: Some((32.6546, 51.6680)),
            rating: 4.0,
            total_reviews: 7,
        },
    )
    .await?;
    let unplaced = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "unplaced",
            coordinates: None,
            rating: 3.0,
            total_reviews: 10,
        },
    )
    .await?;

    let nearby = provider_service::list_veterinarians(
        &app.state,
        ProviderQuery {
            latitude: Some(TEHRAN.0),
            longitude: Some(TEHRAN.1),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("vets");
    let ids: Vec<Uuid> = nearby.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![near.id, karaj.id]);
    assert!(nearby.items.iter().all(|v| v.distance_km.is_some_and(|d| d <= 50.0)));

    let wide = provider_service::list_veterinarians(
        &app.state,
        ProviderQuery {
            latitude: Some(TEHRAN.0),
            longitude: Some(TEHRAN.1),
            radius: Some(500.0),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("vets");
    assert_eq!(wide.items.len(), 3);
    assert_eq!(wide.items[2].id, isfahan.id);

    let by_rating = provider_service::list_veterinarians(&app.state, ProviderQuery::default())
        .await?
        .data
        .expect("vets");
    let ids: Vec<Uuid> = by_rating.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![karaj.id, isfahan.id, unplaced.id, near.id]);
    assert!(by_rating.items.iter().all(|v| v.distance_km.is_none()));
    Ok(())
}

#[tokio::test]
async fn booking_status_permissions() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let stranger = insert_user(&app.state, "stranger@example.com").await?;
    let admin = insert_user(&app.state, "admin@example.com").await?;
    let vet = insert_vet(
        &app.state,
        owner,
        VetSeed {
            name: "دکتر کریمی",
            coordinates: None,
            rating: 0.0,
            total_reviews: 0,
        },
    )
    .await?;
    let booking_id = book_vet(&app.state, customer, vet.id).await?;
    assert!(app.mailer.templates().contains(&"bookingReminder"));

    let set = |status: &str| UpdateBookingStatusRequest {
        status: Some(status.to_string()),
    };

    let stranger_try =
        booking_service::update_booking_status(&app.state, &as_user(stranger), booking_id, set("confirmed"))
            .await;
    assert!(matches!(stranger_try, Err(AppError::Forbidden)));

    let customer_confirm =
        booking_service::update_booking_status(&app.state, &as_user(customer), booking_id, set("confirmed"))
            .await;
    assert!(matches!(customer_confirm, Err(AppError::Forbidden)));

    let confirmed =
        booking_service::update_booking_status(&app.state, &as_user(owner), booking_id, set("confirmed"))
            .await?
            .data
            .expect("booking");
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let invalid =
        booking_service::update_booking_status(&app.state, &as_admin(admin), booking_id, set("lost")).await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    let cancelled =
        booking_service::update_booking_status(&app.state, &as_user(customer), booking_id, set("cancelled"))
            .await?
            .data
            .expect("booking");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    Ok(())
}

#[tokio::test]
async fn booking_rejects_unknown_provider_and_type() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "carrier@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let transporter = insert_transporter(&app.state, owner, "حمل البرز").await?;

    let bad_type = booking_service::create_booking(
        &app.state,
        &as_user(customer),
        CreateBookingRequest {
            service_type: "farrier".into(),
            service_provider_id: transporter.id,
            booking_date: Utc::now(),
            description: None,
        },
    )
    .await;
    assert!(matches!(bad_type, Err(AppError::BadRequest(ref msg)) if msg == "Invalid service type"));

    // a transporter id is not a veterinarian
    let mismatched = booking_service::create_booking(
        &app.state,
        &as_user(customer),
        CreateBookingRequest {
            service_type: "veterinarian".into(),
            service_provider_id: transporter.id,
            booking_date: Utc::now(),
            description: None,
        },
    )
    .await;
    assert!(matches!(mismatched, Err(AppError::NotFound(_))));

    let ok = booking_service::create_booking(
        &app.state,
        &as_user(customer),
        CreateBookingRequest {
            service_type: "transporter".into(),
            service_provider_id: transporter.id,
            booking_date: Utc::now(),
            description: None,
        },
    )
    .await?;
    assert_eq!(ok.data.expect("booking").status, BookingStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn provider_profile_is_editable_only_by_its_owner() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let other = insert_user(&app.state, "other@example.com").await?;

    let bad_location = provider_service::register_veterinarian(
        &app.state,
        &as_user(owner),
        RegisterVeterinarianRequest {
            full_name: "دکتر موسوی".into(),
            specialization: None,
            region: None,
            phone: "0912".into(),
            email: None,
            resume: None,
            image_url: None,
            latitude: Some(123.0),
            longitude: Some(51.0),
            address: None,
        },
    )
    .await;
    assert!(matches!(bad_location, Err(AppError::BadRequest(_))));

    let vet = provider_service::register_veterinarian(
        &app.state,
        &as_user(owner),
        RegisterVeterinarianRequest {
            full_name: "دکتر موسوی".into(),
            specialization: Some("ارتوپدی".into()),
            region: Some("تهران".into()),
            phone: "0912".into(),
            email: None,
            resume: None,
            image_url: None,
            latitude: None,
            longitude: None,
            address: None,
        },
    )
    .await?
    .data
    .expect("vet");
    assert_eq!(vet.rating, 0.0);
    assert_eq!(vet.total_reviews, 0);

    let change = || UpdateVeterinarianRequest {
        region: Some("شیراز".into()),
        ..Default::default()
    };
    let foreign = provider_service::update_veterinarian(&app.state, &as_user(other), vet.id, change()).await;
    assert!(matches!(foreign, Err(AppError::Forbidden)));

    let empty = provider_service::update_veterinarian(
        &app.state,
        &as_user(owner),
        vet.id,
        UpdateVeterinarianRequest::default(),
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let updated = provider_service::update_veterinarian(&app.state, &as_user(owner), vet.id, change())
        .await?
        .data
        .expect("vet");
    assert_eq!(updated.region.as_deref(), Some("شیراز"));
    Ok(())
}

#[tokio::test]
async fn booking_is_kept_when_the_reminder_email_fails() -> anyhow::Result<()> {
    let app = setup_with_failing_mailer().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let vet = insert_vet(&app.state, owner, unrated("دکتر کریمی")).await?;

    let booking_id = book_vet(&app.state, customer, vet.id).await?;

    let stored = ServiceBookings::find_by_id(booking_id)
        .one(&app.state.orm)
        .await?
        .expect("booking");
    assert_eq!(stored.status, BookingStatus::Pending);
    assert_eq!(Notifications::find().count(&app.state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn a_booking_can_be_reviewed_only_once() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "vet@example.com").await?;
    let customer = insert_user(&app.state, "rider@example.com").await?;
    let vet = insert_vet(&app.state, owner, unrated("دکتر نوری")).await?;
    let booking_id = book_vet(&app.state, customer, vet.id).await?;

    review_service::create_review(&app.state, &as_user(customer), review(booking_id, vet.id, 4)).await?;
    let again =
        review_service::create_review(&app.state, &as_user(customer), review(booking_id, vet.id, 1)).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let rated = Veterinarians::find_by_id(vet.id)
        .one(&app.state.orm)
        .await?
        .expect("vet");
    assert_eq!(rated.total_reviews, 1);
    assert!((rated.rating - 4.0).abs() < 1e-9);
    assert_eq!(ServiceReviews::find().count(&app.state.orm).await?, 1);
    Ok(())
}
