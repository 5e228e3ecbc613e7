//! User profile routes.
//!
//! Profiles pair with the `id_user` listing filter: a client shows the
//! profile and lists the user's reviews through `/api/reviews?id_user=`.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::envelope::ApiResponse;
use super::items;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{PublicProfile, User};
use crate::state::AppState;

fn user_not_found() -> AppError {
    AppError::NotFound("user not found".to_string())
}

/// The caller's own account, including email, role and ban state.
///
/// GET /api/users/profile
async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    // First contact may come before any write
    items::register_author(&state, &auth).await?;

    let user = state
        .store()
        .find_user(auth.0.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(ApiResponse::ok("Success get current user", user))
}

/// GET /api/users/{id}
async fn user_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<PublicProfile>>> {
    let id = items::parse_id(&id, "user")?;
    let user = state
        .store()
        .find_user(id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(ApiResponse::ok("Success get user", user.public_profile()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/profile", get(current_user))
        .route("/api/users/{id}", get(user_by_id))
}
