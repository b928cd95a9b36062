//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse incoming requests and delegate to the
//! `auth::service` orchestrator and the login guard for core logic.

use axum::{
    extract::{Extension, Form, Json, Path},
    http::StatusCode,
    response::Json as ResponseJson,
};
use std::sync::Arc;

use crate::api::common::auth_error_to_http;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::services::login_guard::BlockedIdentifier;
use crate::state::AppState;
use crate::utils::jwt::Claims;

/// Handle user login (form-encoded username/password).
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Form(payload): Form<LoginRequest>,
) -> Result<ResponseJson<TokenPairResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&state);

    match auth_service.login(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Handle token refresh.
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<ResponseJson<TokenPairResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&state);

    match auth_service.refresh_token(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Handle logout: revoke the presented access token server-side.
#[axum::debug_handler]
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<LogoutResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&state);

    match auth_service.logout(&identity, &claims).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Get the authenticated identity snapshot.
#[axum::debug_handler]
pub async fn me(
    Extension(identity): Extension<Identity>,
) -> Result<ResponseJson<Identity>, (StatusCode, String)> {
    Ok(ResponseJson(identity))
}

/// List currently blocked identifiers with remaining block TTL (admin).
#[axum::debug_handler]
pub async fn list_blocked(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<ResponseJson<Vec<BlockedIdentifier>>, (StatusCode, String)> {
    match state.guard.list_blocked().await {
        Ok(blocked) => Ok(ResponseJson(blocked)),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Manually unblock an identifier (admin). Clears the block record and the
/// attempt counter.
#[axum::debug_handler]
pub async fn unblock(
    Extension(state): Extension<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<ResponseJson<UnblockResponse>, (StatusCode, String)> {
    match state.guard.unblock(&identifier).await {
        Ok(true) => Ok(ResponseJson(UnblockResponse {
            message: "Identifier unblocked".to_string(),
            identifier,
        })),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            format!("No block record for '{}'", identifier),
        )),
        Err(error) => Err(auth_error_to_http(error)),
    }
}
