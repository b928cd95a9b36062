//! Brute-force login protection.
//!
//! Tracks failed authentication attempts per identifier in the shared
//! key-value store and blocks an identifier once the threshold is reached.
//! Per identifier the state machine is:
//!
//! `Clear -> Counting(n) -> Blocked -> Clear` (block TTL elapses or an
//! admin unblocks).
//!
//! Unknown identifiers get the same failure bookkeeping as real accounts,
//! so response behavior cannot be used to probe which accounts exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::{AuthError, ServiceResult};
use crate::store::KeyValueStore;

const ATTEMPT_KEY_PREFIX: &str = "login:attempts:";
const BLOCK_KEY_PREFIX: &str = "login:block:";

/// Stored value of a block entry. Its existence is authoritative for
/// "is this identifier currently blocked".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
}

/// Block metadata as exposed to the admin listing.
#[derive(Debug, Serialize)]
pub struct BlockedIdentifier {
    pub identifier: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
    pub retry_after_seconds: u64,
}

pub struct LoginGuard {
    store: Arc<dyn KeyValueStore>,
    attempt_window: Duration,
    block_duration: Duration,
    fail_open: bool,
}

impl LoginGuard {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        LoginGuard {
            store,
            attempt_window: Duration::from_secs(config.login_attempt_window_seconds),
            block_duration: Duration::from_secs(config.block_duration_seconds),
            fail_open: config.store_fail_open,
        }
    }

    fn attempt_key(identifier: &str) -> String {
        format!("{}{}", ATTEMPT_KEY_PREFIX, identifier)
    }

    fn block_key(identifier: &str) -> String {
        format!("{}{}", BLOCK_KEY_PREFIX, identifier)
    }

    /// Record a failed attempt and return the new count within the window.
    ///
    /// The window timer starts at the first failure; later failures do not
    /// extend it.
    pub async fn record_failure(&self, identifier: &str) -> ServiceResult<u32> {
        let key = Self::attempt_key(identifier);
        let count = self.store.incr(&key).await?;
        if count == 1 {
            self.store.expire(&key, self.attempt_window).await?;
        }
        Ok(count.max(0) as u32)
    }

    /// Create a block record for `identifier` with the configured duration.
    ///
    /// The attempt counter is left in place; counter and block expire
    /// independently.
    pub async fn block(&self, identifier: &str, reason: &str) -> ServiceResult<()> {
        let record = BlockRecord {
            reason: reason.to_string(),
            blocked_at: Utc::now(),
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| AuthError::internal(format!("Failed to encode block record: {}", e)))?;

        self.store
            .set_ex(&Self::block_key(identifier), &value, self.block_duration)
            .await?;

        info!(identifier, reason, "Identifier blocked");
        Ok(())
    }

    /// Current block state, with seconds until the block lapses.
    ///
    /// Store failures honor the configured fail-open/fail-closed policy.
    pub async fn is_blocked(
        &self,
        identifier: &str,
    ) -> ServiceResult<Option<(BlockRecord, u64)>> {
        let key = Self::block_key(identifier);
        let value = match self.store.get(&key).await {
            Ok(value) => value,
            Err(AuthError::StoreUnavailable { message }) if self.fail_open => {
                warn!("Block check failing open: {}", message);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(value) = value else {
            return Ok(None);
        };

        let record: BlockRecord = serde_json::from_str(&value)
            .map_err(|e| AuthError::internal(format!("Corrupt block record: {}", e)))?;
        let retry_after = self
            .store
            .ttl(&key)
            .await?
            .map(|ttl| ttl.as_secs())
            .unwrap_or_default();

        Ok(Some((record, retry_after)))
    }

    /// Clear the attempt counter. Called on successful authentication; the
    /// block record, if any, is untouched.
    pub async fn reset(&self, identifier: &str) -> ServiceResult<()> {
        self.store.delete(&Self::attempt_key(identifier)).await?;
        Ok(())
    }

    /// Admin unblock: removes the block record and the attempt counter.
    pub async fn unblock(&self, identifier: &str) -> ServiceResult<bool> {
        let removed = self.store.delete(&Self::block_key(identifier)).await?;
        self.store.delete(&Self::attempt_key(identifier)).await?;
        if removed {
            info!(identifier, "Identifier unblocked");
        }
        Ok(removed)
    }

    /// All currently blocked identifiers with remaining block TTL.
    pub async fn list_blocked(&self) -> ServiceResult<Vec<BlockedIdentifier>> {
        let keys = self.store.keys_with_prefix(BLOCK_KEY_PREFIX).await?;
        let mut blocked = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(value) = self.store.get(&key).await? else {
                // Expired between the scan and the read
                continue;
            };
            let record: BlockRecord = serde_json::from_str(&value)
                .map_err(|e| AuthError::internal(format!("Corrupt block record: {}", e)))?;
            let retry_after = self
                .store
                .ttl(&key)
                .await?
                .map(|ttl| ttl.as_secs())
                .unwrap_or_default();

            blocked.push(BlockedIdentifier {
                identifier: key[BLOCK_KEY_PREFIX.len()..].to_string(),
                reason: record.reason,
                blocked_at: record.blocked_at,
                retry_after_seconds: retry_after,
            });
        }

        Ok(blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn guard() -> LoginGuard {
        LoginGuard::new(Arc::new(MemoryStore::new()), &Config::for_tests())
    }

    #[tokio::test]
    async fn test_failure_counter_is_monotonic() {
        let guard = guard();

        for expected in 1..=4 {
            let count = guard.record_failure("alice").await.unwrap();
            assert_eq!(count, expected);
        }
        assert!(guard.is_blocked("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_block_and_query() {
        let guard = guard();

        guard
            .block("alice", "too many failed login attempts (5)")
            .await
            .unwrap();

        let (record, retry_after) = guard.is_blocked("alice").await.unwrap().unwrap();
        assert_eq!(record.reason, "too many failed login attempts (5)");
        assert!(retry_after > 0);
        assert!(retry_after <= 900);
    }

    #[tokio::test]
    async fn test_reset_clears_counter_but_not_block() {
        let guard = guard();

        guard.record_failure("alice").await.unwrap();
        guard.record_failure("alice").await.unwrap();
        guard.block("alice", "threshold reached").await.unwrap();

        guard.reset("alice").await.unwrap();

        // Counter restarts from 1, block record survives
        assert_eq!(guard.record_failure("alice").await.unwrap(), 1);
        assert!(guard.is_blocked("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unblock_clears_both() {
        let guard = guard();

        guard.record_failure("alice").await.unwrap();
        guard.block("alice", "threshold reached").await.unwrap();

        assert!(guard.unblock("alice").await.unwrap());
        assert!(guard.is_blocked("alice").await.unwrap().is_none());
        assert_eq!(guard.record_failure("alice").await.unwrap(), 1);

        // Unblocking a clear identifier reports nothing removed
        assert!(!guard.unblock("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_blocked() {
        let guard = guard();

        guard.block("alice", "threshold reached").await.unwrap();
        guard.block("bob", "manual block").await.unwrap();

        let mut listed = guard.list_blocked().await.unwrap();
        listed.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].identifier, "alice");
        assert_eq!(listed[1].identifier, "bob");
        assert_eq!(listed[1].reason, "manual block");
        assert!(listed.iter().all(|b| b.retry_after_seconds > 0));
    }
}
