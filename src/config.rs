use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub vapid: Option<VapidConfig>,
    pub email: EmailConfig,
}

/// Web Push application server credentials. Keys are URL-safe base64.
#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_secure: bool,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(p) => p.parse::<u16>()?,
            Err(_) => 3000,
        };
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        Ok(Self {
            database_url,
            host,
            port,
            redis_url: non_empty("REDIS_URL"),
            jwt_secret,
            frontend_url,
            vapid: VapidConfig::from_env(),
            email: EmailConfig::from_env()?,
        })
    }
}

impl VapidConfig {
    fn from_env() -> Option<Self> {
        let public_key = non_empty("VAPID_PUBLIC_KEY")?;
        let private_key = non_empty("VAPID_PRIVATE_KEY")?;
        let subject = env::var("VAPID_SUBJECT")
            .unwrap_or_else(|_| "mailto:support@asb-ban.ir".to_string());
        Some(Self {
            public_key,
            private_key,
            subject,
        })
    }
}

impl EmailConfig {
    fn from_env() -> anyhow::Result<Self> {
        let smtp_port = match env::var("SMTP_PORT") {
            Ok(p) => p.parse::<u16>()?,
            Err(_) => 587,
        };
        Ok(Self {
            enabled: flag("EMAIL_ENABLED"),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port,
            smtp_secure: flag("SMTP_SECURE"),
            smtp_user: non_empty("SMTP_USER"),
            smtp_pass: non_empty("SMTP_PASS"),
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_secure: false,
            smtp_user: None,
            smtp_pass: None,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag(key: &str) -> bool {
    env::var(key).map(|v| v == "true").unwrap_or(false)
}
