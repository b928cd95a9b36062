//! Middleware for protecting authenticated routes and handling
//! authorization.
//!
//! `resolve_current_identity` is the single choke point every protected
//! endpoint depends on: decode, signature/expiry validation, revocation
//! check, account load, and active-account policy all happen here before
//! any business logic runs.

use axum::{
    Extension,
    extract::Request,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::common::auth_error_to_http;
use crate::auth::models::Identity;
use crate::errors::{AuthError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::jwt::Claims;

/// Resolve a bearer token into an authenticated identity.
///
/// Fails with `TokenWrongType` for a refresh token, `TokenRevoked` for a
/// logged-out token, `TokenInvalid` when the subject no longer resolves,
/// and `AccountInactive` for a deactivated account. The revocation check
/// follows the configured fail-open/fail-closed store policy.
pub async fn resolve_current_identity(
    state: &AppState,
    token: &str,
) -> ServiceResult<(Identity, Claims)> {
    let claims = state.codec.decode(token)?;

    if !claims.is_access() {
        return Err(AuthError::TokenWrongType);
    }

    if state.revocations.is_revoked(&claims.jti).await? {
        return Err(AuthError::TokenRevoked);
    }

    let user = UserRepository::new(&state.pool)
        .get_user_by_id(&claims.sub)
        .await?
        .ok_or(AuthError::TokenInvalid)?;

    if !user.is_active {
        return Err(AuthError::AccountInactive);
    }

    Ok((Identity::from(&user), claims))
}

/// Bearer token authentication middleware.
///
/// On success the resolved `Identity` and the token `Claims` are attached
/// to the request extensions for handlers downstream.
pub async fn jwt_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| auth_error_to_http(AuthError::TokenInvalid))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| auth_error_to_http(AuthError::TokenInvalid))?;

    let (identity, claims) = resolve_current_identity(&state, token)
        .await
        .map_err(auth_error_to_http)?;

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Superuser authorization middleware; must run after `jwt_auth`.
pub async fn admin_auth(request: Request, next: Next) -> Result<Response, (StatusCode, String)> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| auth_error_to_http(AuthError::TokenInvalid))?;

    if !identity.is_superuser {
        return Err(auth_error_to_http(AuthError::permission_denied(
            "The user doesn't have enough privileges",
        )));
    }

    Ok(next.run(request).await)
}
