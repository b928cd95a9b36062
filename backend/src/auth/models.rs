//! Data structures for authentication-related entities.
//!
//! Request/response payloads for the auth endpoints and the identity
//! snapshot attached to authenticated requests.

use crate::database::models::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request payload (form-encoded).
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Token refresh request.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout acknowledgment.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
    pub username: String,
}

/// Unblock acknowledgment.
#[derive(Debug, Serialize)]
pub struct UnblockResponse {
    pub message: String,
    pub identifier: String,
}

/// Identity established for an authenticated request. No secrets.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
        }
    }
}
