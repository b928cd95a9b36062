//! Authentication module: login, logout, refresh, and the identity
//! middleware every protected endpoint depends on.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
