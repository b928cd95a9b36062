//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, token signing material, login-guard policy, and the
//! key-value store connection.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Shared secret used to sign and verify tokens. Process-wide immutable.
    pub jwt_secret: String,
    /// Signing algorithm name (e.g. "HS256"). Tokens signed with any other
    /// algorithm are rejected.
    pub jwt_algorithm: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    /// Failed logins allowed within the attempt window before an identifier
    /// is blocked.
    pub max_login_attempts: u32,
    pub login_attempt_window_seconds: u64,
    pub block_duration_seconds: u64,
    pub redis_url: String,
    /// Upper bound on any single key-value store call.
    pub store_timeout_seconds: u64,
    /// When the key-value store is unreachable, `true` lets revocation and
    /// block checks pass (fail-open); `false` rejects the request
    /// (fail-closed). Authentication writes always fail closed.
    pub store_fail_open: bool,
    pub server_port: u16,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        let jwt_algorithm = env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());

        let access_token_ttl_seconds = env::var("ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "1800".to_string())
            .parse::<u64>()
            .context("ACCESS_TOKEN_TTL_SECONDS must be a valid number")?;

        let refresh_token_ttl_seconds = env::var("REFRESH_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<u64>()
            .context("REFRESH_TOKEN_TTL_SECONDS must be a valid number")?;

        let max_login_attempts = env::var("MAX_LOGIN_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("MAX_LOGIN_ATTEMPTS must be a valid number")?;

        let login_attempt_window_seconds = env::var("LOGIN_ATTEMPT_WINDOW_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .context("LOGIN_ATTEMPT_WINDOW_SECONDS must be a valid number")?;

        let block_duration_seconds = env::var("BLOCK_DURATION_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("BLOCK_DURATION_SECONDS must be a valid number")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let store_timeout_seconds = env::var("STORE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<u64>()
            .context("STORE_TIMEOUT_SECONDS must be a valid number")?;

        let store_fail_open = env::var("STORE_FAIL_OPEN")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .context("STORE_FAIL_OPEN must be true or false")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            jwt_algorithm,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            max_login_attempts,
            login_attempt_window_seconds,
            block_duration_seconds,
            redis_url,
            store_timeout_seconds,
            store_fail_open,
            server_port,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for unit tests; no environment access.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            jwt_secret: "test-secret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_ttl_seconds: 1800,
            refresh_token_ttl_seconds: 604800,
            max_login_attempts: 5,
            login_attempt_window_seconds: 300,
            block_duration_seconds: 900,
            redis_url: "redis://localhost:6379".to_string(),
            store_timeout_seconds: 2,
            store_fail_open: false,
            server_port: 3000,
        }
    }
}
