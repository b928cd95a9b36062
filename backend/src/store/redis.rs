//! Redis-backed key-value store.
//!
//! Uses a multiplexed async connection. Every call carries a bounded
//! timeout; a slow or unreachable backend surfaces as `StoreUnavailable`
//! rather than hanging the request.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Config;
use crate::errors::{AuthError, ServiceResult};
use crate::store::KeyValueStore;

pub struct RedisStore {
    client: Client,
    timeout: Duration,
}

impl RedisStore {
    /// Create a store from the configured connection URL and timeout.
    pub fn new(config: &Config) -> ServiceResult<Self> {
        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            AuthError::store_unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(RedisStore {
            client,
            timeout: Duration::from_secs(config.store_timeout_seconds),
        })
    }

    async fn connection(&self) -> ServiceResult<MultiplexedConnection> {
        match timeout(self.timeout, self.client.get_multiplexed_async_connection()).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(AuthError::store_unavailable(format!(
                "Failed to get Redis connection: {}",
                e
            ))),
            Err(_) => Err(AuthError::store_unavailable(format!(
                "Redis connection timed out after {:?}",
                self.timeout
            ))),
        }
    }

    async fn run<T, F>(&self, op: &str, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AuthError::store_unavailable(format!(
                "Redis {} failed: {}",
                op, e
            ))),
            Err(_) => Err(AuthError::store_unavailable(format!(
                "Redis {} timed out after {:?}",
                op, self.timeout
            ))),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        let mut conn = self.connection().await?;
        self.run("GET", async move { conn.get(key).await }).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> ServiceResult<()> {
        let mut conn = self.connection().await?;
        let secs = ttl.as_secs().max(1);
        self.run("SETEX", async move { conn.set_ex(key, value, secs).await })
            .await
    }

    async fn delete(&self, key: &str) -> ServiceResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = self.run("DEL", async move { conn.del(key).await }).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> ServiceResult<bool> {
        let mut conn = self.connection().await?;
        let count: i64 = self
            .run("EXISTS", async move { conn.exists(key).await })
            .await?;
        Ok(count > 0)
    }

    async fn incr(&self, key: &str) -> ServiceResult<i64> {
        let mut conn = self.connection().await?;
        self.run("INCR", async move { conn.incr(key, 1i64).await })
            .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> ServiceResult<bool> {
        let mut conn = self.connection().await?;
        let secs = ttl.as_secs().max(1) as i64;
        let set: i64 = self
            .run("EXPIRE", async move { conn.expire(key, secs).await })
            .await?;
        Ok(set > 0)
    }

    async fn ttl(&self, key: &str) -> ServiceResult<Option<Duration>> {
        let mut conn = self.connection().await?;
        let secs: i64 = self.run("TTL", async move { conn.ttl(key).await }).await?;
        // -2 means no such key, -1 means no expiry
        if secs >= 0 {
            Ok(Some(Duration::from_secs(secs as u64)))
        } else {
            Ok(None)
        }
    }

    async fn keys_with_prefix(&self, prefix: &str) -> ServiceResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", prefix);

        self.run("SCAN", async move {
            let mut cursor: u64 = 0;
            let mut keys = Vec::new();
            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(100)
                    .query_async(&mut conn)
                    .await?;
                keys.extend(batch);
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            Ok(keys)
        })
        .await
    }
}
