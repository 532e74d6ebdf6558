use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PushSubscription;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubscriptionInput {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub subscription: SubscriptionInput,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TestPushRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub link: Option<String>,
    /// Notification type, `system` when absent.
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VapidKey {
    pub public_key: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SentCount {
    pub sent_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionList {
    pub items: Vec<PushSubscription>,
}
