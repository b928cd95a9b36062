//! Central module for the application's API plumbing.
//!
//! Business-resource routers (items, user profiles) consume the identity
//! established by the auth module and live with their own services; this
//! module carries only the shared response and error-mapping helpers.

pub mod common;
