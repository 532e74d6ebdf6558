use std::sync::Arc;

use crate::{
    cache::CacheStore, config::AppConfig, db::OrmConn, mailer::Mailer, push::PushSender,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub cache: Arc<dyn CacheStore>,
    pub mailer: Arc<dyn Mailer>,
    /// `None` when no VAPID keys are configured.
    pub push: Option<Arc<dyn PushSender>>,
    pub config: Arc<AppConfig>,
}
