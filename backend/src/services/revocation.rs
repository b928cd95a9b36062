//! Server-side token revocation.
//!
//! Revoked token IDs are recorded in the key-value store with a TTL no
//! longer than the token's remaining lifetime, so an entry never outlives
//! the token it blocks and storage is self-cleaning. Every access-token
//! validation path must consult this store before trusting a decoded token.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::Config;
use crate::errors::{AuthError, ServiceResult};
use crate::store::KeyValueStore;

const REVOKED_KEY_PREFIX: &str = "token:revoked:";

pub struct RevocationStore {
    store: Arc<dyn KeyValueStore>,
    /// When the backend is unreachable, pass checks instead of rejecting.
    /// Default is fail-closed; see `Config::store_fail_open`.
    fail_open: bool,
}

impl RevocationStore {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        RevocationStore {
            store,
            fail_open: config.store_fail_open,
        }
    }

    fn key(jti: &str) -> String {
        format!("{}{}", REVOKED_KEY_PREFIX, jti)
    }

    /// Record `jti` as revoked for `ttl`. Idempotent; re-revoking refreshes
    /// the entry. Writes always fail closed.
    pub async fn revoke(&self, jti: &str, ttl: Duration) -> ServiceResult<()> {
        self.store.set_ex(&Self::key(jti), "revoked", ttl).await
    }

    /// Whether `jti` is currently revoked.
    ///
    /// On a store failure this honors the configured fail-open/fail-closed
    /// policy: fail-open treats the token as not revoked, fail-closed
    /// propagates `StoreUnavailable` and the request is rejected.
    pub async fn is_revoked(&self, jti: &str) -> ServiceResult<bool> {
        match self.store.exists(&Self::key(jti)).await {
            Ok(revoked) => Ok(revoked),
            Err(AuthError::StoreUnavailable { message }) if self.fail_open => {
                warn!("Revocation check failing open: {}", message);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct DownStore;

    #[async_trait]
    impl KeyValueStore for DownStore {
        async fn get(&self, _key: &str) -> ServiceResult<Option<String>> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> ServiceResult<()> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn delete(&self, _key: &str) -> ServiceResult<bool> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn exists(&self, _key: &str) -> ServiceResult<bool> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn incr(&self, _key: &str) -> ServiceResult<i64> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> ServiceResult<bool> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn ttl(&self, _key: &str) -> ServiceResult<Option<Duration>> {
            Err(AuthError::store_unavailable("down"))
        }
        async fn keys_with_prefix(&self, _prefix: &str) -> ServiceResult<Vec<String>> {
            Err(AuthError::store_unavailable("down"))
        }
    }

    #[tokio::test]
    async fn test_revoke_then_check() {
        let revocations =
            RevocationStore::new(Arc::new(MemoryStore::new()), &Config::for_tests());

        assert!(!revocations.is_revoked("jti-1").await.unwrap());
        revocations
            .revoke("jti-1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(revocations.is_revoked("jti-1").await.unwrap());

        // Idempotent
        revocations
            .revoke("jti-1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(revocations.is_revoked("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entry_expires_with_token() {
        let revocations =
            RevocationStore::new(Arc::new(MemoryStore::new()), &Config::for_tests());

        revocations
            .revoke("jti-2", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(revocations.is_revoked("jti-2").await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!revocations.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_closed_by_default() {
        let revocations = RevocationStore::new(Arc::new(DownStore), &Config::for_tests());

        assert!(matches!(
            revocations.is_revoked("jti-3").await,
            Err(AuthError::StoreUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_fail_open_when_configured() {
        let mut config = Config::for_tests();
        config.store_fail_open = true;
        let revocations = RevocationStore::new(Arc::new(DownStore), &config);

        assert!(!revocations.is_revoked("jti-4").await.unwrap());

        // Writes still fail closed
        assert!(
            revocations
                .revoke("jti-4", Duration::from_secs(60))
                .await
                .is_err()
        );
    }
}
