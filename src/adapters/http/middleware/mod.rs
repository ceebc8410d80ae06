//! HTTP middleware for axum.
//!
//! - `admin_auth` - Shared-token guard for the admin routes

pub mod admin_auth;

pub use admin_auth::{admin_auth_middleware, AdminAuthState, ADMIN_TOKEN_HEADER};
