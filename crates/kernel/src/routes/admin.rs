//! Administrative routes: dashboard counters, account moderation and
//! content removal.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch},
};
use serde::Deserialize;
use serde_json::Value;

use super::envelope::ApiResponse;
use super::items;
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{ItemKind, Role, SiteStats, User};
use crate::state::AppState;

// =============================================================================
// Dashboard
// =============================================================================

/// GET /api/admin/stats
async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<SiteStats>>> {
    let stats = state.store().stats().await?;
    Ok(ApiResponse::ok("Success get stats", stats))
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    #[serde(default)]
    role: String,
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let users = state.store().list_users().await?;
    Ok(ApiResponse::ok("Success get users", users))
}

/// Ban or unban an account. Takes effect on the user's next request.
///
/// PATCH /api/admin/users/{id}/ban
async fn toggle_ban(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    let id = items::parse_id(&id, "user")?;
    let user = state
        .store()
        .toggle_ban(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let action = if user.is_banned { "banned" } else { "unbanned" };
    tracing::info!(admin = %admin.user_id, user = %id, action, "account moderation");

    Ok(ApiResponse::ok(format!("User {action} successfully"), user))
}

/// PATCH /api/admin/users/{id}/role
async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let id = items::parse_id(&id, "user")?;
    let role = Role::parse(&body.role)
        .ok_or_else(|| AppError::BadRequest(format!("invalid role: {}", body.role)))?;

    let user = state
        .store()
        .set_role(id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    tracing::info!(admin = %admin.user_id, user = %id, role = role.as_str(), "role changed");
    Ok(ApiResponse::ok("User role updated successfully", user))
}

// =============================================================================
// Content
// =============================================================================

/// Remove any review or forum thread.
///
/// DELETE /api/admin/content/{kind}/{id}
async fn delete_content(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let kind = ItemKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("unknown content kind: {kind}")))?;
    let id = items::parse_id(&id, kind.label())?;

    tracing::info!(admin = %admin.user_id, kind = kind.label(), %id, "admin content removal");
    items::remove(&state, kind, id).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/ban", patch(toggle_ban))
        .route("/api/admin/users/{id}/role", patch(update_role))
        .route("/api/admin/content/{kind}/{id}", delete(delete_content))
}
