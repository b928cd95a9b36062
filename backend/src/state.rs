//! Process-lifetime application state.
//!
//! All components that need the database pool or the key-value store get
//! them through this injected handle; nothing is lazily initialized behind
//! a global.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::ServiceResult;
use crate::services::login_guard::LoginGuard;
use crate::services::revocation::RevocationStore;
use crate::store::KeyValueStore;
use crate::utils::jwt::TokenCodec;

pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub codec: TokenCodec,
    pub guard: LoginGuard,
    pub revocations: RevocationStore,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: SqlitePool,
        store: Arc<dyn KeyValueStore>,
    ) -> ServiceResult<Self> {
        let codec = TokenCodec::new(&config)?;
        let guard = LoginGuard::new(store.clone(), &config);
        let revocations = RevocationStore::new(store, &config);

        Ok(AppState {
            config,
            pool,
            codec,
            guard,
            revocations,
        })
    }
}
