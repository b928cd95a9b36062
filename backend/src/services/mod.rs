//! Module for core business logic services.
//!
//! These services coordinate the shared key-value store and the credential
//! records behind the authentication flows: brute-force login protection,
//! server-side token revocation, and user provisioning.

pub mod login_guard;
pub mod revocation;
pub mod user_service;
