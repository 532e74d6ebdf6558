//! Disposable read-through cache.
//!
//! The relational store stays the source of truth; everything here may be
//! dropped at any time. Backend failures are logged and reported as a miss so
//! that a broken cache never fails a request.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64);
    async fn delete(&self, key: &str);
    async fn delete_prefix(&self, prefix: &str);
}

/// Typed read helper: a value that fails to deserialize counts as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    let raw = cache.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding undecodable cache entry");
            None
        }
    }
}

pub async fn set_json<T: Serialize>(cache: &dyn CacheStore, key: &str, value: &T, ttl_secs: u64) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.set(key, &raw, ttl_secs).await,
        Err(err) => tracing::warn!(key, error = %err, "cache value not serializable"),
    }
}

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "redis get failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        let mut conn = self.conn.clone();
        let result = if ttl_secs > 0 {
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await
        } else {
            conn.set::<_, _, ()>(key, value).await
        };
        if let Err(err) = result {
            tracing::warn!(key, error = %err, "redis set failed");
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(err) = conn.del::<_, ()>(key).await {
            tracing::warn!(key, error = %err, "redis delete failed");
        }
    }

    async fn delete_prefix(&self, prefix: &str) {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let keys: Vec<String> = match conn.scan_match::<_, String>(&pattern).await {
            Ok(mut iter) => {
                let mut keys = Vec::new();
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
                keys
            }
            Err(err) => {
                tracing::warn!(prefix, error = %err, "redis scan failed");
                return;
            }
        };

        if keys.is_empty() {
            return;
        }
        let mut conn = self.conn.clone();
        if let Err(err) = conn.del::<_, ()>(keys).await {
            tracing::warn!(prefix, error = %err, "redis delete failed");
        }
    }
}

/// Used when no `REDIS_URL` is configured.
pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) {}

    async fn delete(&self, _key: &str) {}

    async fn delete_prefix(&self, _prefix: &str) {}
}

/// In-process store with per-entry expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        let expired = match entries.get(key)? {
            (_, Some(expires)) => *expires <= Instant::now(),
            (_, None) => false,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(value, _)| value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        let expires = (ttl_secs > 0).then(|| Instant::now() + Duration::from_secs(ttl_secs));
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (value.to_string(), expires));
        }
    }

    async fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    async fn delete_prefix(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| !key.starts_with(prefix));
        }
    }
}
