//! Main entry point for the Aegis backend.
//!
//! Initializes the Axum web server, the database connection pool, and the
//! shared key-value store, and registers the authentication routes.
//! Business-resource routers are mounted by their own services and consume
//! the identity middleware exposed by the auth module.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod state;
mod store;
mod utils;

use axum::{Extension, Router, response::Json, routing::get};
use config::Config;
use database::Database;
use state::AppState;
use std::sync::Arc;
use store::redis::RedisStore;
use tracing::info;
use tracing_subscriber::fmt::init;

use crate::api::common::ApiResponse;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().expect("configuration must be valid");
    let db = Database::new(&config)
        .await
        .expect("database must be reachable");
    let kv_store = RedisStore::new(&config).expect("key-value store config must be valid");

    let state = Arc::new(
        AppState::new(config.clone(), db.pool().clone(), Arc::new(kv_store))
            .expect("application state must initialize"),
    );

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .layer(Extension(state));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("server port must be bindable");

    info!("Starting Aegis server on port {}", config.server_port);
    axum::serve(listener, app).await.expect("server error");
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Aegis Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Aegis API",
    ))
}
