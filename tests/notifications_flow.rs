mod common;

use asb_ban_api::{
    dto::{
        competitions::CreateCompetitionRequest,
        push::{SubscribeRequest, SubscriptionInput, SubscriptionKeys, TestPushRequest},
    },
    entity::{PushSubscriptions, sea_orm_active_enums::NotificationType},
    error::AppError,
    push::DeliveryOutcome,
    routes::params::{CompetitionQuery, NotificationQuery},
    services::{
        competition_service,
        notification_service::{self, NewNotification},
        push_service,
    },
    state::AppState,
};
use chrono::NaiveDate;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use common::{as_admin, as_user, insert_user, setup};

fn system_note(user_id: Uuid, title: &str) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: NotificationType::System,
        title: title.to_string(),
        message: "پیام آزمایشی".to_string(),
        link: None,
    }
}

fn subscription(endpoint: &str) -> SubscribeRequest {
    SubscribeRequest {
        subscription: SubscriptionInput {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: "p256dh-key".to_string(),
                auth: "auth-secret".to_string(),
            },
        },
    }
}

async fn unread(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    let count = notification_service::unread_count(state, &as_user(user_id))
        .await?
        .data
        .expect("count");
    Ok(count.count)
}

#[tokio::test]
async fn mark_read_is_idempotent_and_scoped_to_owner() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "owner@example.com").await?;
    let other = insert_user(&app.state, "other@example.com").await?;
    let note = notification_service::create_notification(&app.state, system_note(owner, "سلام")).await?;

    let first = notification_service::mark_read(&app.state, &as_user(owner), note.id)
        .await?
        .data
        .expect("notification");
    let second = notification_service::mark_read(&app.state, &as_user(owner), note.id)
        .await?
        .data
        .expect("notification");
    assert!(first.is_read && second.is_read);
    assert_eq!(unread(&app.state, owner).await?, 0);

    let foreign = notification_service::mark_read(&app.state, &as_user(other), note.id).await;
    assert!(matches!(foreign, Err(AppError::NotFound(ref msg)) if msg == "Notification not found"));
    Ok(())
}

#[tokio::test]
async fn writes_invalidate_cached_list_and_unread_count() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = insert_user(&app.state, "rider@example.com").await?;
    notification_service::create_notification(&app.state, system_note(user, "اول")).await?;

    assert_eq!(unread(&app.state, user).await?, 1);
    let listed = notification_service::list_notifications(
        &app.state,
        &as_user(user),
        NotificationQuery::default(),
    )
    .await?;
    assert_eq!(listed.data.expect("list").items.len(), 1);
    assert!(app.cache.contains(&format!("notifications:{user}:unread")));
    assert!(app.cache.contains(&format!("notifications:{user}:list:20")));

    notification_service::create_notification(&app.state, system_note(user, "دوم")).await?;
    assert!(!app.cache.contains(&format!("notifications:{user}:unread")));
    assert!(!app.cache.contains(&format!("notifications:{user}:list:20")));
    assert_eq!(unread(&app.state, user).await?, 2);

    let marked = notification_service::mark_all_read(&app.state, &as_user(user))
        .await?
        .data
        .expect("updated");
    assert_eq!(marked.updated, 2);
    assert_eq!(unread(&app.state, user).await?, 0);

    let newest_first = notification_service::list_notifications(
        &app.state,
        &as_user(user),
        NotificationQuery { limit: Some(1) },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(newest_first.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_removes_only_own_notification() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = insert_user(&app.state, "owner@example.com").await?;
    let other = insert_user(&app.state, "other@example.com").await?;
    let note = notification_service::create_notification(&app.state, system_note(owner, "حذف")).await?;

    let foreign = notification_service::delete_notification(&app.state, &as_user(other), note.id).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    notification_service::delete_notification(&app.state, &as_user(owner), note.id).await?;
    assert_eq!(unread(&app.state, owner).await?, 0);
    Ok(())
}

#[tokio::test]
async fn gone_endpoints_are_pruned_while_others_still_deliver() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = insert_user(&app.state, "rider@example.com").await?;
    for endpoint in ["https://push.example/phone", "https://push.example/laptop", "https://push.example/old"] {
        push_service::subscribe(&app.state, &as_user(user), subscription(endpoint), None).await?;
    }
    app.push.script("https://push.example/old", DeliveryOutcome::Gone);
    app.push.script(
        "https://push.example/laptop",
        DeliveryOutcome::Failed("timeout".into()),
    );

    let sent = push_service::send_test(
        &app.state,
        &as_user(user),
        TestPushRequest {
            title: Some("آزمایش".into()),
            message: Some("پیام".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("sent");

    assert_eq!(sent.sent_count, 1);
    assert_eq!(app.push.attempts().len(), 3);

    let remaining: Vec<String> = push_service::list_subscriptions(&app.state, &as_user(user))
        .await?
        .data
        .expect("subscriptions")
        .items
        .into_iter()
        .map(|s| s.endpoint)
        .collect();
    assert_eq!(remaining.len(), 2);
    assert!(!remaining.contains(&"https://push.example/old".to_string()));

    // the test push is also recorded in-app
    assert_eq!(unread(&app.state, user).await?, 1);
    Ok(())
}

#[tokio::test]
async fn resubscribing_an_endpoint_replaces_the_row() -> anyhow::Result<()> {
    let app = setup().await?;
    let first = insert_user(&app.state, "first@example.com").await?;
    let second = insert_user(&app.state, "second@example.com").await?;
    let endpoint = "https://push.example/shared-device";

    push_service::subscribe(&app.state, &as_user(first), subscription(endpoint), None).await?;
    let moved = push_service::subscribe(
        &app.state,
        &as_user(second),
        subscription(endpoint),
        Some("Firefox".into()),
    )
    .await?
    .data
    .expect("subscription");

    assert_eq!(moved.user_agent.as_deref(), Some("Firefox"));
    assert_eq!(PushSubscriptions::find().count(&app.state.orm).await?, 1);

    let invalid = push_service::subscribe(&app.state, &as_user(first), subscription(" "), None).await;
    assert!(matches!(invalid, Err(AppError::BadRequest(ref msg)) if msg == "Invalid subscription object"));

    push_service::unsubscribe(&app.state, &as_user(second), endpoint).await?;
    assert_eq!(PushSubscriptions::find().count(&app.state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_push_validates_input() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = insert_user(&app.state, "rider@example.com").await?;

    let missing = push_service::send_test(
        &app.state,
        &as_user(user),
        TestPushRequest {
            title: Some("عنوان".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::BadRequest(ref msg)) if msg == "Title and message are required"));

    let bad_type = push_service::send_test(
        &app.state,
        &as_user(user),
        TestPushRequest {
            title: Some("عنوان".into()),
            message: Some("پیام".into()),
            notification_type: Some("carrier-pigeon".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(bad_type, Err(AppError::BadRequest(ref msg)) if msg == "Invalid notification type"));

    let key = push_service::vapid_public_key(&app.state).await?.data.expect("key");
    assert_eq!(key.public_key, "BTestPublicKey");
    Ok(())
}

fn competition(title: &str, start: NaiveDate) -> CreateCompetitionRequest {
    CreateCompetitionRequest {
        title: title.to_string(),
        description: None,
        competition_type: "show_jumping".to_string(),
        location: Some("تهران".to_string()),
        start_date: start,
        end_date: start.succ_opt(),
        registration_deadline: None,
        prize_info: None,
        image_url: None,
        is_international: Some(false),
        is_published: Some(true),
    }
}

#[tokio::test]
async fn competitions_are_cached_and_invalidated_on_create() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = insert_user(&app.state, "admin@example.com").await?;
    let spring = NaiveDate::from_ymd_opt(2027, 3, 21).expect("date");
    let autumn = NaiveDate::from_ymd_opt(2026, 10, 30).expect("date");

    competition_service::create_competition(&app.state, &as_admin(admin), competition("جام بهار", spring))
        .await?;
    let listed = competition_service::list_competitions(&app.state, CompetitionQuery::default())
        .await?
        .data
        .expect("list");
    assert_eq!(listed.items.len(), 1);
    let key = format!("competitions:list:{}", CompetitionQuery::default().cache_fragment());
    assert!(app.cache.contains(&key));

    competition_service::create_competition(&app.state, &as_admin(admin), competition("جام پاییز", autumn))
        .await?;
    assert!(!app.cache.contains(&key));

    let listed = competition_service::list_competitions(&app.state, CompetitionQuery::default())
        .await?
        .data
        .expect("list");
    let titles: Vec<&str> = listed.items.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["جام پاییز", "جام بهار"]);

    let by_slug = competition_service::get_competition(&app.state, &listed.items[1].slug)
        .await?
        .data
        .expect("competition");
    assert_eq!(by_slug.start_date, spring);
    Ok(())
}

#[tokio::test]
async fn competition_creation_rules() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = insert_user(&app.state, "admin@example.com").await?;
    let rider = insert_user(&app.state, "rider@example.com").await?;
    let date = NaiveDate::from_ymd_opt(2027, 5, 1).expect("date");

    let forbidden =
        competition_service::create_competition(&app.state, &as_user(rider), competition("جام", date)).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    competition_service::create_competition(&app.state, &as_admin(admin), competition("جام", date)).await?;
    let duplicate =
        competition_service::create_competition(&app.state, &as_admin(admin), competition("جام", date)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let mut backwards = competition("جام معکوس", date);
    backwards.end_date = date.pred_opt();
    let backwards = competition_service::create_competition(&app.state, &as_admin(admin), backwards).await;
    assert!(matches!(backwards, Err(AppError::BadRequest(_))));

    let missing = competition_service::get_competition(&app.state, "no-such-event").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}
