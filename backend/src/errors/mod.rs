//! Global application error types and handlers.
//!
//! This module defines the authentication error taxonomy used across the
//! backend and provides mechanisms for consistent error handling and
//! response formatting.

use thiserror::Error;

/// Errors surfaced by the authentication and session-security core.
///
/// Wrong-password and unknown-identifier failures are deliberately the same
/// variant so callers cannot distinguish them.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials {
        /// Failed attempts left before the identifier is blocked.
        attempts_remaining: Option<u32>,
    },

    #[error("Account blocked: {reason}")]
    AccountBlocked {
        reason: String,
        retry_after_seconds: u64,
    },

    #[error("Inactive user")]
    AccountInactive,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("Invalid token signature")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Invalid token type")]
    TokenWrongType,

    #[error("User not found")]
    UserNotFound,

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Key-value store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ServiceResult<T> = Result<T, AuthError>;

impl AuthError {
    // Helper constructors for common patterns

    pub fn invalid_credentials(attempts_remaining: Option<u32>) -> Self {
        Self::InvalidCredentials { attempts_remaining }
    }

    pub fn blocked(reason: impl Into<String>, retry_after_seconds: u64) -> Self {
        Self::AccountBlocked {
            reason: reason.into(),
            retry_after_seconds,
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
