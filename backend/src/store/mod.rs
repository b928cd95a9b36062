//! Shared key-value store abstraction.
//!
//! All cross-request coordination (attempt counters, block records,
//! revocation entries) lives in a shared TTL-capable key-value store. The
//! store must provide atomic increment and set-with-expiry; the core itself
//! needs no locks. The production backend is Redis; an in-memory backend
//! serves tests and single-node development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::errors::{AuthError, ServiceResult};

pub mod redis;

/// TTL-capable key-value store used for all cross-request state.
///
/// Implementations report backend failures as `AuthError::StoreUnavailable`;
/// the caller decides fail-open vs fail-closed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>>;

    /// Set `key` to `value`, expiring after `ttl`. Overwrites any existing
    /// entry and its TTL.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> ServiceResult<()>;

    /// Delete `key`; returns whether an entry existed.
    async fn delete(&self, key: &str) -> ServiceResult<bool>;

    async fn exists(&self, key: &str) -> ServiceResult<bool>;

    /// Atomically increment the integer at `key`, creating it at 1.
    async fn incr(&self, key: &str) -> ServiceResult<i64>;

    /// Set or refresh the TTL of an existing key; returns whether the key
    /// existed.
    async fn expire(&self, key: &str, ttl: Duration) -> ServiceResult<bool>;

    /// Remaining TTL of `key`, `None` if the key is missing or unexpiring.
    async fn ttl(&self, key: &str) -> ServiceResult<Option<Duration>>;

    /// All live keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> ServiceResult<Vec<String>>;
}

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory store for tests and single-node development.
///
/// Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ServiceResult<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| AuthError::store_unavailable("memory store lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> ServiceResult<()> {
        self.lock()?.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> ServiceResult<bool> {
        let mut entries = self.lock()?;
        match entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> ServiceResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn incr(&self, key: &str) -> ServiceResult<i64> {
        let mut entries = self.lock()?;

        let current = match entries.get(key) {
            Some(entry) if !entry.is_expired() => entry
                .value
                .parse::<i64>()
                .map_err(|_| AuthError::store_unavailable("counter holds a non-integer value"))?,
            _ => 0,
        };
        let next = current + 1;

        let expires_at = entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| entry.expires_at);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: next.to_string(),
                expires_at,
            },
        );

        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> ServiceResult<bool> {
        let mut entries = self.lock()?;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> ServiceResult<Option<Duration>> {
        let entries = self.lock()?;
        Ok(entries.get(key).filter(|entry| !entry.is_expired()).and_then(
            |entry| {
                entry
                    .expires_at
                    .map(|at| at.saturating_duration_since(Instant::now()))
            },
        ))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> ServiceResult<Vec<String>> {
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "v", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.exists("k").await.unwrap());
        assert!(store.delete("k").await.unwrap());
        assert!(!store.exists("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "v", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_starts_at_one_and_keeps_ttl() {
        let store = MemoryStore::new();

        assert_eq!(store.incr("n").await.unwrap(), 1);
        assert!(store.expire("n", Duration::from_secs(60)).await.unwrap());
        assert_eq!(store.incr("n").await.unwrap(), 2);
        assert_eq!(store.incr("n").await.unwrap(), 3);
        assert!(store.ttl("n").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expire_on_missing_key() {
        let store = MemoryStore::new();
        assert!(!store.expire("nope", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MemoryStore::new();
        store
            .set_ex("block:alice", "x", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set_ex("block:bob", "x", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set_ex("other:carol", "x", Duration::from_secs(60))
            .await
            .unwrap();

        let mut keys = store.keys_with_prefix("block:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["block:alice", "block:bob"]);
    }
}
