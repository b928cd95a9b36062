//! Collection of general utility modules shared across the backend.

pub mod jwt;
pub mod password;
