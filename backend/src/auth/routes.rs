//! Defines the HTTP routes for authentication.
//!
//! Login, logout, refresh, the identity snapshot, and the admin surface of
//! the login guard. Designed to be nested into the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

/// Creates the authentication router with all auth-related routes.
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout).layer(middleware::from_fn(jwt_auth)))
        .route("/me", get(me).layer(middleware::from_fn(jwt_auth)))
        .route(
            "/blocked",
            get(list_blocked)
                .layer(middleware::from_fn(admin_auth))
                .layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/blocked/{identifier}",
            delete(unblock)
                .layer(middleware::from_fn(admin_auth))
                .layer(middleware::from_fn(jwt_auth)),
        )
}
