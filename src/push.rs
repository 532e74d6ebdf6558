//! Web Push delivery.

use async_trait::async_trait;
use serde::Serialize;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, URL_SAFE_NO_PAD,
    VapidSignatureBuilder, WebPushClient, WebPushError, WebPushMessageBuilder,
};

use crate::{
    config::VapidConfig,
    entity::sea_orm_active_enums::{NotificationType, enum_value},
};

const DEFAULT_ICON: &str = "/icon-192x192.png";

/// Endpoint and client keys of one browser/device registration.
#[derive(Debug, Clone, PartialEq)]
pub struct PushTarget {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The push service answered 404/410: the subscription will never work again.
    Gone,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub notification_type: NotificationType,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
struct PushBody<'a> {
    title: &'a str,
    message: &'a str,
    body: &'a str,
    icon: &'a str,
    badge: &'a str,
    tag: String,
    data: PushData<'a>,
    dir: &'a str,
    lang: &'a str,
    #[serde(rename = "requireInteraction")]
    require_interaction: bool,
}

#[derive(Debug, Serialize)]
struct PushData<'a> {
    url: &'a str,
    #[serde(rename = "type")]
    kind: String,
}

impl PushMessage {
    /// JSON document handed to the service worker.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        let kind = enum_value(&self.notification_type);
        let body = PushBody {
            title: &self.title,
            message: &self.message,
            body: &self.message,
            icon: self.icon.as_deref().unwrap_or(DEFAULT_ICON),
            badge: DEFAULT_ICON,
            tag: kind.clone(),
            data: PushData {
                url: self.link.as_deref().unwrap_or("/"),
                kind,
            },
            dir: "rtl",
            lang: "fa",
            require_interaction: false,
        };
        serde_json::to_string(&body)
    }
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn deliver(&self, target: &PushTarget, payload: &str) -> DeliveryOutcome;
}

pub struct WebPushSender {
    client: IsahcWebPushClient,
    private_key: String,
    subject: String,
}

impl WebPushSender {
    pub fn new(config: &VapidConfig) -> anyhow::Result<Self> {
        let client = IsahcWebPushClient::new()?;
        Ok(Self {
            client,
            private_key: config.private_key.clone(),
            subject: config.subject.clone(),
        })
    }

    async fn try_deliver(&self, target: &PushTarget, payload: &str) -> Result<(), WebPushError> {
        let info = SubscriptionInfo::new(&target.endpoint, &target.p256dh, &target.auth);

        let mut signature = VapidSignatureBuilder::from_base64(&self.private_key, URL_SAFE_NO_PAD, &info)?;
        signature.add_claim("sub", self.subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_vapid_signature(signature.build()?);

        self.client.send(builder.build()?).await
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn deliver(&self, target: &PushTarget, payload: &str) -> DeliveryOutcome {
        match self.try_deliver(target, payload).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(WebPushError::EndpointNotValid { .. } | WebPushError::EndpointNotFound { .. }) => {
                DeliveryOutcome::Gone
            }
            Err(err) => DeliveryOutcome::Failed(err.to_string()),
        }
    }
}
