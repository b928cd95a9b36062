//! Core business logic for the authentication system.
//!
//! Composes the login guard, credential hasher, token codec, and revocation
//! store into the login, logout, and refresh flows.

use std::time::Duration;
use validator::Validate;

use crate::auth::models::*;
use crate::config::Config;
use crate::errors::{AuthError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::login_guard::LoginGuard;
use crate::services::revocation::RevocationStore;
use crate::services::user_service::UserService;
use crate::state::AppState;
use crate::utils::jwt::{Claims, TokenCodec};
use crate::utils::password;
use sqlx::SqlitePool;

/// Authentication service for the login, logout, and refresh flows.
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    codec: &'a TokenCodec,
    guard: &'a LoginGuard,
    revocations: &'a RevocationStore,
    config: &'a Config,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService borrowing the shared application state.
    pub fn new(state: &'a AppState) -> Self {
        AuthService {
            pool: &state.pool,
            codec: &state.codec,
            guard: &state.guard,
            revocations: &state.revocations,
            config: &state.config,
        }
    }

    /// Authenticate a user and issue an access/refresh token pair.
    ///
    /// Order matters: the block check comes first and wins over a correct
    /// password; the active-account check happens only after the password
    /// verified and is not rate-limited.
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<TokenPairResponse> {
        if let Err(validation_errors) = login_request.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(AuthError::validation(error_messages.join(", ")));
        }

        let identifier = login_request.username.as_str();

        if let Some((record, retry_after)) = self.guard.is_blocked(identifier).await? {
            return Err(AuthError::blocked(record.reason, retry_after));
        }

        let repo = UserRepository::new(self.pool);
        let user = repo.get_user_by_username_or_email(identifier).await?;

        let Some(user) = user else {
            // Unknown identifiers get the same bookkeeping, the same error,
            // and a comparable amount of hashing work as real ones.
            password::dummy_verify(&login_request.password);
            return Err(self.failed_attempt(identifier).await?);
        };

        if !password::verify_password(&login_request.password, &user.password_hash) {
            return Err(self.failed_attempt(identifier).await?);
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        self.guard.reset(identifier).await?;

        self.issue_token_pair(&user.id)
    }

    /// Record a failed attempt and build the rejection to return.
    ///
    /// Crossing the threshold transitions the identifier to Blocked; the
    /// block reason carries the attempt count.
    async fn failed_attempt(&self, identifier: &str) -> ServiceResult<AuthError> {
        let count = self.guard.record_failure(identifier).await?;

        if count >= self.config.max_login_attempts {
            let reason = format!("too many failed login attempts ({})", count);
            self.guard.block(identifier, &reason).await?;
            return Ok(AuthError::blocked(
                reason,
                self.config.block_duration_seconds,
            ));
        }

        Ok(AuthError::invalid_credentials(Some(
            self.config.max_login_attempts - count,
        )))
    }

    /// Revoke the presented access token for its remaining lifetime.
    ///
    /// Succeeds whether or not any lifetime remained; an already-lapsed
    /// token needs no revocation entry.
    pub async fn logout(
        &self,
        identity: &Identity,
        claims: &Claims,
    ) -> ServiceResult<LogoutResponse> {
        if let Some(ttl) = claims.remaining_ttl_seconds() {
            self.revocations
                .revoke(&claims.jti, Duration::from_secs(ttl))
                .await?;
        }

        Ok(LogoutResponse {
            message: "Successfully logged out".to_string(),
            username: identity.username.clone(),
        })
    }

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// The presented refresh token is spent: its jti is revoked for its
    /// remaining lifetime, so a rotated-out token cannot be replayed.
    pub async fn refresh_token(
        &self,
        request: RefreshTokenRequest,
    ) -> ServiceResult<TokenPairResponse> {
        if request.refresh_token.is_empty() {
            return Err(AuthError::validation("Refresh token is required"));
        }

        let claims = self.codec.decode(&request.refresh_token)?;

        if !claims.is_refresh() {
            return Err(AuthError::TokenWrongType);
        }

        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        let user_service = UserService::new(self.pool);
        let user = user_service.get_user_required(&claims.sub).await?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        if let Some(ttl) = claims.remaining_ttl_seconds() {
            self.revocations
                .revoke(&claims.jti, Duration::from_secs(ttl))
                .await?;
        }

        self.issue_token_pair(&user.id)
    }

    fn issue_token_pair(&self, subject: &str) -> ServiceResult<TokenPairResponse> {
        let access_token = self.codec.issue_access(
            subject,
            self.config.access_token_ttl_seconds as i64,
            None,
        )?;
        let refresh_token = self
            .codec
            .issue_refresh(subject, self.config.refresh_token_ttl_seconds as i64)?;

        Ok(TokenPairResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.config.access_token_ttl_seconds,
        })
    }
}
