#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

use asb_ban_api::{
    cache::MemoryCache,
    config::{AppConfig, EmailConfig, VapidConfig},
    db::create_schema,
    entity::{
        blog_categories, horse_transporters, product_categories, products, push_subscriptions,
        users, veterinarians,
    },
    mailer::{EmailTemplate, Mailer},
    middleware::auth::{ADMIN_ROLE, AuthUser},
    push::{DeliveryOutcome, PushSender, PushTarget},
    state::AppState,
};

/// Captures every e-mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, &'static str)>>,
}

impl RecordingMailer {
    pub fn templates(&self) -> Vec<&'static str> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|(_, name)| *name).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, email: &EmailTemplate) -> anyhow::Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_string(), email.name()));
        }
        Ok(())
    }
}

/// Mailer whose SMTP relay is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _email: &EmailTemplate) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unavailable")
    }
}

/// Push sender answering from a per-endpoint script; unknown endpoints succeed.
#[derive(Default)]
pub struct ScriptedPush {
    pub outcomes: Mutex<HashMap<String, DeliveryOutcome>>,
    pub attempts: Mutex<Vec<String>>,
}

impl ScriptedPush {
    pub fn script(&self, endpoint: &str, outcome: DeliveryOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(endpoint.to_string(), outcome);
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PushSender for ScriptedPush {
    async fn deliver(&self, target: &PushTarget, _payload: &str) -> DeliveryOutcome {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(target.endpoint.clone());
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|o| o.get(&target.endpoint).cloned())
            .unwrap_or(DeliveryOutcome::Delivered)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub cache: Arc<MemoryCache>,
    pub mailer: Arc<RecordingMailer>,
    pub push: Arc<ScriptedPush>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        redis_url: None,
        jwt_secret: "test-secret".to_string(),
        frontend_url: "http://localhost:3001".to_string(),
        vapid: Some(VapidConfig {
            public_key: "BTestPublicKey".to_string(),
            private_key: "test-private-key".to_string(),
            subject: "mailto:test@asb-ban.ir".to_string(),
        }),
        email: EmailConfig::disabled(),
    }
}

/// Fresh in-memory database with the full schema.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup() -> anyhow::Result<TestApp> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    create_schema(&orm).await?;

    let cache = Arc::new(MemoryCache::new());
    let mailer = Arc::new(RecordingMailer::default());
    let push = Arc::new(ScriptedPush::default());

    let state = AppState {
        orm,
        cache: cache.clone(),
        mailer: mailer.clone(),
        push: Some(push.clone()),
        config: Arc::new(test_config()),
    };

    Ok(TestApp {
        state,
        cache,
        mailer,
        push,
    })
}

/// Same as `setup`, but every outbound e-mail fails.
pub async fn setup_with_failing_mailer() -> anyhow::Result<TestApp> {
    let mut app = setup().await?;
    app.state.mailer = Arc::new(FailingMailer);
    Ok(app)
}

pub fn as_user(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        role: "user".to_string(),
    }
}

pub fn as_role(user_id: Uuid, role: &str) -> AuthUser {
    AuthUser {
        user_id,
        role: role.to_string(),
    }
}

pub fn as_admin(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        role: ADMIN_ROLE.to_string(),
    }
}

pub async fn insert_user(state: &AppState, email: &str) -> anyhow::Result<Uuid> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(format!("Rider {email}")),
        role: Set("user".to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

pub async fn insert_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let now = Utc::now();
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(asb_ban_api::services::slugify(name)),
        description: Set(None),
        price: Set(price),
        stock_quantity: Set(stock),
        is_active: Set(true),
        category_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub struct VetSeed<'a> {
    pub name: &'a str,
    pub coordinates: Option<(f64, f64)>,
    pub rating: f64,
    pub total_reviews: i32,
}

pub async fn insert_vet(
    state: &AppState,
    owner_id: Uuid,
    seed: VetSeed<'_>,
) -> anyhow::Result<veterinarians::Model> {
    let now = Utc::now();
    let vet = veterinarians::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner_id),
        full_name: Set(seed.name.to_string()),
        specialization: Set(Some("جراحی".to_string())),
        region: Set(Some("تهران".to_string())),
        phone: Set("09120000000".to_string()),
        email: Set(None),
        resume: Set(None),
        image_url: Set(None),
        latitude: Set(seed.coordinates.map(|(lat, _)| lat)),
        longitude: Set(seed.coordinates.map(|(_, lng)| lng)),
        address: Set(None),
        rating: Set(seed.rating),
        total_reviews: Set(seed.total_reviews),
        is_verified: Set(true),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(vet)
}

pub async fn insert_transporter(
    state: &AppState,
    owner_id: Uuid,
    company: &str,
) -> anyhow::Result<horse_transporters::Model> {
    let now = Utc::now();
    let transporter = horse_transporters::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner_id),
        company_name: Set(company.to_string()),
        contact_name: Set("رضا".to_string()),
        phone: Set("09121111111".to_string()),
        email: Set(None),
        region: Set(Some("کرج".to_string())),
        equipment: Set(None),
        transport_info: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        address: Set(None),
        rating: Set(0.0),
        total_reviews: Set(0),
        is_verified: Set(false),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(transporter)
}

pub async fn insert_device(state: &AppState, user_id: Uuid, endpoint: &str) -> anyhow::Result<()> {
    let now = Utc::now();
    push_subscriptions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        endpoint: Set(endpoint.to_string()),
        p256dh: Set("p256dh-key".to_string()),
        auth: Set("auth-secret".to_string()),
        user_agent: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn insert_product_category(state: &AppState, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let category = product_categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn insert_blog_category(state: &AppState, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let category = blog_categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}
