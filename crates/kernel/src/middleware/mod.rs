//! HTTP middleware components.

pub mod auth;

pub use auth::{AdminUser, AuthUser, authenticate_bearer_token};
