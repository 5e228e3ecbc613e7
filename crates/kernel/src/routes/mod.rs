//! HTTP route handlers.

pub mod admin;
pub mod catalog;
pub mod envelope;
pub mod forum;
pub mod health;
mod items;
pub mod report;
pub mod review;
pub mod user;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::authenticate_bearer_token;
use crate::state::AppState;

/// Assemble every router behind bearer authentication and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(review::router())
        .merge(forum::router())
        .merge(catalog::router())
        .merge(report::router())
        .merge(user::router())
        .merge(admin::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_bearer_token,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
