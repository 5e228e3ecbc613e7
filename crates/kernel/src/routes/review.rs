//! Review routes.
//!
//! Listing, search and liked/bookmarked lists go through the list query
//! engine. A review can reply to another review or be posted into a forum
//! thread; its detail view carries every direct reply.

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

const KIND: ItemKind = ItemKind::Review;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub id_subject: Option<Uuid>,
    pub id_lecturer: Option<Uuid>,
    /// Parent review.
    pub id_reply: Option<Uuid>,
    /// Parent forum thread.
    pub id_forum: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CreateReviewRequest {
    fn into_new_item(self, author_id: Uuid) -> NewItem {
        NewItem {
            kind: KIND,
            author_id,
            subject_id: self.id_subject,
            lecturer_id: self.id_lecturer,
            reply_to_id: self.id_reply,
            forum_id: self.id_forum,
            title: self.title.trim().to_string(),
            body: self.body,
            files: self.files,
            is_anonymous: self.is_anonymous,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: ItemView,
    pub replies: Vec<ItemView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/reviews
async fn list_reviews(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::list(&state, KIND, &viewer, &query).await
}

/// GET /api/reviews/search?q=
async fn search_reviews(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::search(&state, KIND, &viewer, &query).await
}

/// GET /api/reviews/liked?id_user=
async fn liked_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::engaged(&state, KIND, EngagementKind::Like, &auth, &query).await
}

/// GET /api/reviews/bookmarked
async fn bookmarked_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    items::engaged(&state, KIND, EngagementKind::Bookmark, &auth, &query).await
}

/// GET /api/reviews/{id}
async fn get_review(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ReviewDetail>>> {
    let id = items::parse_id(&id, "review")?;

    let (review, replies) = tokio::try_join!(
        state.listing().find(KIND, id, &viewer),
        state.listing().replies(KIND, id, &viewer),
    )?;
    let review = review.ok_or_else(|| items::not_found(KIND))?;

    Ok(ApiResponse::ok(
        "Success get review detail",
        ReviewDetail { review, replies },
    ))
}

/// POST /api/reviews
async fn create_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    let input = request.into_new_item(auth.0.user_id);
    items::create(&state, &auth, input).await
}

/// PATCH /api/reviews/{id}
async fn update_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<ItemChanges>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let id = items::parse_id(&id, "review")?;
    items::update(&state, KIND, &auth, id, changes).await
}

/// DELETE /api/reviews/{id}
async fn delete_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let id = items::parse_id(&id, "review")?;
    items::delete(&state, KIND, &auth, id).await
}

/// POST /api/reviews/{id}/like
async fn like_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    let id = items::parse_id(&id, "review")?;
    items::engage(&state, KIND, EngagementKind::Like, &auth, id).await
}

/// DELETE /api/reviews/{id}/like
async fn unlike_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let id = items::parse_id(&id, "review")?;
    items::disengage(&state, KIND, EngagementKind::Like, &auth, id).await
}

/// POST /api/reviews/{id}/bookmark
async fn bookmark_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    let id = items::parse_id(&id, "review")?;
    items::engage(&state, KIND, EngagementKind::Bookmark, &auth, id).await
}

/// DELETE /api/reviews/{id}/bookmark
async fn unbookmark_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let id = items::parse_id(&id, "review")?;
    items::disengage(&state, KIND, EngagementKind::Bookmark, &auth, id).await
}

// =============================================================================
// Router
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list_reviews).post(create_review))
        .route("/api/reviews/search", get(search_reviews))
        .route("/api/reviews/liked", get(liked_reviews))
        .route("/api/reviews/bookmarked", get(bookmarked_reviews))
        .route(
            "/api/reviews/{id}",
            get(get_review).patch(update_review).delete(delete_review),
        )
        .route(
            "/api/reviews/{id}/like",
            post(like_review).delete(unlike_review),
        )
        .route(
            "/api/reviews/{id}/bookmark",
            post(bookmark_review).delete(unbookmark_review),
        )
}
