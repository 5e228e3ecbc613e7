//! Forum thread routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::envelope::{ApiResponse, ListResponse};
use super::items;
use crate::error::AppResult;
use crate::listing::{ItemView, ListQuery, Viewer};
use crate::middleware::AuthUser;
use crate::models::{EngagementKind, ItemChanges, ItemKind, NewItem};
use crate::state::AppState;

const KIND: ItemKind = ItemKind::Forum;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateForumRequest {
    pub id_subject: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CreateForumRequest {
    fn into_new_item(self, author_id: Uuid) -> NewItem {
        NewItem {
            kind: KIND,
            author_id,
            subject_id: self.id_subject,
            lecturer_id: None,
            reply_to_id: None,
            forum_id: None,
            title: self.title.trim().to_string(),
            body: self.description,
            files: self.files,
            is_anonymous: self.is_anonymous,
        }
    }
}

/// A thread together with the reviews posted into it.
#[derive(Debug, Serialize)]
pub struct ForumDetail {
    #[serde(flatten)]
    pub forum: ItemView,
    pub reviews: Vec<ItemView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/forums
async fn list_forums(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::list(&state, KIND, &viewer, &query).await
}

/// GET /api/forums/subject/{id_subject}
async fn list_subject_forums(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id_subject): Path<String>,
    Query(mut query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    query.id_subject = Some(id_subject);
    items::list(&state, KIND, &viewer, &query).await
}

/// GET /api/forums/search?q=
async fn search_forums(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::search(&state, KIND, &viewer, &query).await
}

/// GET /api/forums/liked?id_user=
async fn liked_forums(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::engaged(&state, KIND, EngagementKind::Like, &auth, &query).await
}

/// GET /api/forums/bookmarked
async fn bookmarked_forums(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::engaged(&state, KIND, EngagementKind::Bookmark, &auth, &query).await
}

/// GET /api/forums/{id}
async fn get_forum(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ForumDetail>>> {
    let id = items::parse_id(&id, "forum")?;

    let (forum, reviews) = tokio::try_join!(
        state.listing().find(KIND, id, &viewer),
        state.listing().replies(KIND, id, &viewer),
    )?;
    let forum = forum.ok_or_else(|| items::not_found(KIND))?;

    Ok(ApiResponse::ok(
        "Success get forum detail",
        ForumDetail { forum, reviews },
    ))
}

/// POST /api/forums
async fn create_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateForumRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    let input = request.into_new_item(auth.0.user_id);
    items::create(&state, &auth, input).await
}

/// PATCH /api/forums/{id}
async fn update_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<ItemChanges>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let id = items::parse_id(&id, "forum")?;
    items::update(&state, KIND, &auth, id, changes).await
}

/// DELETE /api/forums/{id}
async fn delete_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let id = items::parse_id(&id, "forum")?;
    items::delete(&state, KIND, &auth, id).await
}

/// POST /api/forums/{id}/like
async fn like_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    let id = items::parse_id(&id, "forum")?;
    items::engage(&state, KIND, EngagementKind::Like, &auth, id).await
}

/// DELETE /api/forums/{id}/like
async fn unlike_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let id = items::parse_id(&id, "forum")?;
    items::disengage(&state, KIND, EngagementKind::Like, &auth, id).await
}

/// POST /api/forums/{id}/bookmark
async fn bookmark_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    let id = items::parse_id(&id, "forum")?;
    items::engage(&state, KIND, EngagementKind::Bookmark, &auth, id).await
}

/// DELETE /api/forums/{id}/bookmark
async fn unbookmark_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let id = items::parse_id(&id, "forum")?;
    items::disengage(&state, KIND, EngagementKind::Bookmark, &auth, id).await
}

// =============================================================================
// Router
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/forums", get(list_forums).post(create_forum))
        .route("/api/forums/search", get(search_forums))
        .route("/api/forums/liked", get(liked_forums))
        .route("/api/forums/bookmarked", get(bookmarked_forums))
        .route("/api/forums/subject/{id_subject}", get(list_subject_forums))
        .route(
            "/api/forums/{id}",
            get(get_forum).patch(update_forum).delete(delete_forum),
        )
        .route(
            "/api/forums/{id}/like",
            post(like_forum).delete(unlike_forum),
        )
        .route(
            "/api/forums/{id}/bookmark",
            post(bookmark_forum).delete(unbookmark_forum),
        )
}
