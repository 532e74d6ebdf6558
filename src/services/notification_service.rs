use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    cache::{get_json, set_json},
    dto::notifications::{NotificationList, UnreadCount, UpdatedCount},
    effects::best_effort,
    entity::{
        notifications::{ActiveModel, Column, Entity as Notifications, Model as NotificationModel},
        sea_orm_active_enums::NotificationType,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Notification,
    push::PushMessage,
    response::ApiResponse,
    routes::params::NotificationQuery,
    services::push_service,
    state::AppState,
};

const LIST_TTL_SECS: u64 = 300;
const UNREAD_TTL_SECS: u64 = 60;

/// An in-app notification produced by an internal write path.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

fn list_key(user_id: Uuid, limit: u64) -> String {
    format!("notifications:{user_id}:list:{limit}")
}

fn unread_key(user_id: Uuid) -> String {
    format!("notifications:{user_id}:unread")
}

async fn invalidate(state: &AppState, user_id: Uuid) {
    state
        .cache
        .delete_prefix(&format!("notifications:{user_id}:"))
        .await;
}

/// Persists the row and drops the owner's cached list and unread count.
pub async fn create_notification(
    state: &AppState,
    new: NewNotification,
) -> AppResult<Notification> {
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        notification_type: Set(new.notification_type),
        title: Set(new.title),
        message: Set(new.message),
        link: Set(new.link),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    invalidate(state, model.user_id).await;
    Ok(notification_from_entity(model))
}

/// In-app notification followed by a push to every device of the user.
///
/// The push half is best-effort; only a failed insert is reported.
pub async fn notify_user(state: &AppState, new: NewNotification) -> AppResult<Notification> {
    let message = PushMessage {
        title: new.title.clone(),
        message: new.message.clone(),
        link: new.link.clone(),
        notification_type: new.notification_type.clone(),
        icon: None,
    };
    let notification = create_notification(state, new).await?;

    best_effort(
        "push",
        push_service::send_push_to_user(state, notification.user_id, &message),
    )
    .await;

    Ok(notification)
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: NotificationQuery,
) -> AppResult<ApiResponse<NotificationList>> {
    let limit = query.limit();
    let key = list_key(user.user_id, limit);

    if let Some(cached) = get_json::<NotificationList>(state.cache.as_ref(), &key).await {
        return Ok(ApiResponse::data(cached));
    }

    let items = Notifications::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(notification_from_entity)
        .collect();

    let list = NotificationList { items };
    set_json(state.cache.as_ref(), &key, &list, LIST_TTL_SECS).await;
    Ok(ApiResponse::data(list))
}

pub async fn unread_count(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UnreadCount>> {
    let key = unread_key(user.user_id);

    if let Some(cached) = get_json::<UnreadCount>(state.cache.as_ref(), &key).await {
        return Ok(ApiResponse::data(cached));
    }

    let count = Notifications::find()
        .filter(
            Condition::all()
                .add(Column::UserId.eq(user.user_id))
                .add(Column::IsRead.eq(false)),
        )
        .count(&state.orm)
        .await?;

    let unread = UnreadCount { count };
    set_json(state.cache.as_ref(), &key, &unread, UNREAD_TTL_SECS).await;
    Ok(ApiResponse::data(unread))
}

/// Idempotent: an already-read notification is returned unchanged.
pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let existing = find_owned(state, user, id).await?;

    let model = if existing.is_read {
        existing
    } else {
        let mut active: ActiveModel = existing.into();
        active.is_read = Set(true);
        active.update(&state.orm).await?
    };

    invalidate(state, user.user_id).await;
    Ok(ApiResponse::success(
        "Notification marked as read",
        notification_from_entity(model),
        None,
    ))
}

pub async fn mark_all_read(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UpdatedCount>> {
    let result = Notifications::update_many()
        .col_expr(Column::IsRead, Expr::value(true))
        .filter(
            Condition::all()
                .add(Column::UserId.eq(user.user_id))
                .add(Column::IsRead.eq(false)),
        )
        .exec(&state.orm)
        .await?;

    invalidate(state, user.user_id).await;
    Ok(ApiResponse::success(
        "All notifications marked as read",
        UpdatedCount {
            updated: result.rows_affected,
        },
        None,
    ))
}

pub async fn delete_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<()>> {
    let existing = find_owned(state, user, id).await?;
    Notifications::delete_by_id(existing.id)
        .exec(&state.orm)
        .await?;

    invalidate(state, user.user_id).await;
    Ok(ApiResponse::message("Notification deleted"))
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<NotificationModel> {
    Notifications::find()
        .filter(
            Condition::all()
                .add(Column::Id.eq(id))
                .add(Column::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))
}

fn notification_from_entity(model: NotificationModel) -> Notification {
    Notification {
        id: model.id,
        user_id: model.user_id,
        notification_type: model.notification_type,
        title: model.title,
        message: model.message,
        link: model.link,
        is_read: model.is_read,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
