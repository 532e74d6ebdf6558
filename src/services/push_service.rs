use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    dto::push::{SentCount, SubscribeRequest, SubscriptionList, TestPushRequest, VapidKey},
    entity::{
        push_subscriptions::{
            ActiveModel, Column, Entity as PushSubscriptions, Model as SubscriptionModel,
        },
        sea_orm_active_enums::{NotificationType, parse_enum},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::PushSubscription,
    push::{DeliveryOutcome, PushMessage, PushTarget},
    response::ApiResponse,
    services::notification_service::{self, NewNotification},
    state::AppState,
};

pub async fn vapid_public_key(state: &AppState) -> AppResult<ApiResponse<VapidKey>> {
    let vapid = state
        .config
        .vapid
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Push notifications not configured".into()))?;

    Ok(ApiResponse::data(VapidKey {
        public_key: vapid.public_key.clone(),
    }))
}

/// Upserts by endpoint: a device that re-subscribes (possibly as another
/// user) replaces its keys instead of creating a second row.
pub async fn subscribe(
    state: &AppState,
    user: &AuthUser,
    payload: SubscribeRequest,
    user_agent: Option<String>,
) -> AppResult<ApiResponse<PushSubscription>> {
    let sub = payload.subscription;
    if sub.endpoint.trim().is_empty()
        || sub.keys.p256dh.trim().is_empty()
        || sub.keys.auth.trim().is_empty()
    {
        return Err(AppError::BadRequest("Invalid subscription object".into()));
    }

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        endpoint: Set(sub.endpoint.clone()),
        p256dh: Set(sub.keys.p256dh),
        auth: Set(sub.keys.auth),
        user_agent: Set(user_agent),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    PushSubscriptions::insert(active)
        .on_conflict(
            OnConflict::column(Column::Endpoint)
                .update_columns([
                    Column::UserId,
                    Column::P256dh,
                    Column::Auth,
                    Column::UserAgent,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    let saved = PushSubscriptions::find()
        .filter(Column::Endpoint.eq(sub.endpoint))
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("push subscription vanished after upsert"))?;

    Ok(ApiResponse::success(
        "Push subscription saved successfully",
        subscription_from_entity(saved),
        None,
    ))
}

pub async fn unsubscribe(
    state: &AppState,
    user: &AuthUser,
    endpoint: &str,
) -> AppResult<ApiResponse<()>> {
    if endpoint.trim().is_empty() {
        return Err(AppError::BadRequest("Endpoint is required".into()));
    }

    PushSubscriptions::delete_many()
        .filter(
            Condition::all()
                .add(Column::Endpoint.eq(endpoint))
                .add(Column::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::message("Push subscription removed successfully"))
}

pub async fn list_subscriptions(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let items = PushSubscriptions::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::UpdatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(subscription_from_entity)
        .collect();

    Ok(ApiResponse::data(SubscriptionList { items }))
}

/// Delivers `message` to every subscription of `user_id` and returns how many
/// deliveries succeeded.
///
/// Subscriptions the push service reports as gone are deleted; other failures
/// are logged and do not stop delivery to the remaining devices. Returns 0
/// when push is not configured.
pub async fn send_push_to_user(
    state: &AppState,
    user_id: Uuid,
    message: &PushMessage,
) -> AppResult<usize> {
    let Some(sender) = state.push.as_ref() else {
        tracing::debug!(%user_id, "push not configured, skipping delivery");
        return Ok(0);
    };

    let payload = message
        .to_payload()
        .map_err(|err| anyhow::anyhow!("push payload: {err}"))?;

    let subscriptions = PushSubscriptions::find()
        .filter(Column::UserId.eq(user_id))
        .all(&state.orm)
        .await?;

    let mut delivered = 0;
    for sub in subscriptions {
        let target = PushTarget {
            endpoint: sub.endpoint.clone(),
            p256dh: sub.p256dh.clone(),
            auth: sub.auth.clone(),
        };

        match sender.deliver(&target, &payload).await {
            DeliveryOutcome::Delivered => delivered += 1,
            DeliveryOutcome::Gone => {
                tracing::info!(%user_id, endpoint = %sub.endpoint, "pruning expired push subscription");
                if let Err(err) = PushSubscriptions::delete_by_id(sub.id).exec(&state.orm).await {
                    tracing::warn!(error = %err, "failed to delete expired push subscription");
                }
            }
            DeliveryOutcome::Failed(reason) => {
                tracing::warn!(%user_id, endpoint = %sub.endpoint, error = %reason, "push delivery failed");
            }
        }
    }

    Ok(delivered)
}

pub async fn send_test(
    state: &AppState,
    user: &AuthUser,
    payload: TestPushRequest,
) -> AppResult<ApiResponse<SentCount>> {
    let (Some(title), Some(message)) = (
        payload.title.filter(|t| !t.trim().is_empty()),
        payload.message.filter(|m| !m.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Title and message are required".into()));
    };

    let notification_type = match payload.notification_type.as_deref() {
        None => NotificationType::System,
        Some(raw) => parse_enum::<NotificationType>(raw)
            .ok_or_else(|| AppError::BadRequest("Invalid notification type".into()))?,
    };

    notification_service::create_notification(
        state,
        NewNotification {
            user_id: user.user_id,
            notification_type: notification_type.clone(),
            title: title.clone(),
            message: message.clone(),
            link: payload.link.clone(),
        },
    )
    .await?;

    let sent_count = send_push_to_user(
        state,
        user.user_id,
        &PushMessage {
            title,
            message,
            link: payload.link,
            notification_type,
            icon: None,
        },
    )
    .await?;

    Ok(ApiResponse::success(
        format!("Push notification sent to {sent_count} device(s)"),
        SentCount { sent_count },
        None,
    ))
}

fn subscription_from_entity(model: SubscriptionModel) -> PushSubscription {
    PushSubscription {
        id: model.id,
        endpoint: model.endpoint,
        user_agent: model.user_agent,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
