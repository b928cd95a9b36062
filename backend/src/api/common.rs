//! Error handling utilities for API responses.
//!
//! Converts the domain error taxonomy into consistent HTTP responses.
//! All errors return a JSON body containing:
//! - `message`: human-readable message
//! - `error.error_type`: machine-readable category
//! - `error.retry_after_seconds`: present on block errors
//!
//! Unknown-identifier and wrong-password logins map to the same status and
//! wording; internal and database failures are logged and surface a generic
//! body.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// Standard API response wrapper for all endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Error details for failed requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Seconds until a blocked identifier may retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response.
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        retry_after_seconds: Option<u64>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                retry_after_seconds,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts an AuthError to an HTTP response with the standard format.
pub fn auth_error_to_http(error: AuthError) -> (StatusCode, String) {
    let mut retry_after = None;

    let (status, error_type, message) = match error {
        AuthError::InvalidCredentials { attempts_remaining } => {
            let message = match attempts_remaining {
                Some(n) => format!("Incorrect username or password, {} attempts remaining", n),
                None => "Incorrect username or password".to_string(),
            };
            (StatusCode::UNAUTHORIZED, "invalid_credentials", message)
        }
        AuthError::AccountBlocked {
            reason,
            retry_after_seconds,
        } => {
            retry_after = Some(retry_after_seconds);
            (
                StatusCode::FORBIDDEN,
                "account_blocked",
                format!("Account blocked: {}", reason),
            )
        }
        AuthError::AccountInactive => (
            StatusCode::BAD_REQUEST,
            "inactive_user",
            "Inactive user".to_string(),
        ),
        AuthError::TokenMalformed => (
            StatusCode::BAD_REQUEST,
            "token_malformed",
            "Malformed token".to_string(),
        ),
        AuthError::TokenInvalid => (
            StatusCode::UNAUTHORIZED,
            "token_invalid",
            "Could not validate credentials".to_string(),
        ),
        AuthError::TokenExpired => (
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "Token has expired".to_string(),
        ),
        AuthError::TokenRevoked => (
            StatusCode::UNAUTHORIZED,
            "token_revoked",
            "Token has been revoked".to_string(),
        ),
        AuthError::TokenWrongType => (
            StatusCode::UNAUTHORIZED,
            "token_wrong_type",
            "Invalid token type".to_string(),
        ),
        AuthError::UserNotFound => (
            StatusCode::NOT_FOUND,
            "user_not_found",
            "User not found".to_string(),
        ),
        AuthError::PermissionDenied { message } => {
            (StatusCode::FORBIDDEN, "permission_denied", message)
        }
        AuthError::StoreUnavailable { message } => {
            tracing::error!("Key-value store unavailable: {}", message);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Service temporarily unavailable".to_string(),
            )
        }
        AuthError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        AuthError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error".to_string(),
            )
        }
        AuthError::Internal { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        }
    };

    let error_response = ApiResponse::<()>::error(message, error_type, retry_after);
    (
        status,
        serde_json::to_string(&error_response).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                auth_error_to_http(AuthError::invalid_credentials(Some(3))).0,
                StatusCode::UNAUTHORIZED,
            ),
            (
                auth_error_to_http(AuthError::blocked("too many failures", 900)).0,
                StatusCode::FORBIDDEN,
            ),
            (
                auth_error_to_http(AuthError::AccountInactive).0,
                StatusCode::BAD_REQUEST,
            ),
            (
                auth_error_to_http(AuthError::TokenMalformed).0,
                StatusCode::BAD_REQUEST,
            ),
            (
                auth_error_to_http(AuthError::TokenExpired).0,
                StatusCode::UNAUTHORIZED,
            ),
            (
                auth_error_to_http(AuthError::TokenRevoked).0,
                StatusCode::UNAUTHORIZED,
            ),
            (
                auth_error_to_http(AuthError::UserNotFound).0,
                StatusCode::NOT_FOUND,
            ),
            (
                auth_error_to_http(AuthError::store_unavailable("down")).0,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (actual, expected) in cases {
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_unknown_user_and_wrong_password_share_a_body() {
        // Both paths construct the same variant; same status and wording
        let (status_a, body_a) = auth_error_to_http(AuthError::invalid_credentials(Some(4)));
        let (status_b, body_b) = auth_error_to_http(AuthError::invalid_credentials(Some(4)));

        assert_eq!(status_a, status_b);
        assert_eq!(body_a, body_b);
    }

    #[test]
    fn test_block_response_carries_retry_after() {
        let (_, body) = auth_error_to_http(AuthError::blocked(
            "too many failed login attempts (5)",
            900,
        ));
        let parsed: ApiResponse<()> = serde_json::from_str(&body).unwrap();

        assert!(!parsed.success);
        assert!(parsed.message.contains("(5)"));
        assert_eq!(parsed.error.unwrap().retry_after_seconds, Some(900));
    }
}
