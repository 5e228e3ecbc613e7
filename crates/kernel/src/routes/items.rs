//! Handler logic shared by the review and forum routes.
//!
//! Both item kinds expose the same listing, detail, edit, delete and
//! engagement endpoints; the per-kind modules only differ in request
//! bodies, detail payloads and messages.

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use super::envelope::{ApiResponse, ListResponse};
use crate::error::{AppError, AppResult};
use crate::listing::{ItemView, ListQuery, Viewer};
use crate::middleware::AuthUser;
use crate::models::{EngagementEdge, EngagementKind, Item, ItemChanges, ItemKind, NewItem, User};
use crate::state::AppState;
use crate::store::StoreError;

/// Parse an id path segment, rejecting malformed ids with a JSON 400.
pub(super) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::BadRequest(format!("invalid {what} id")))
}

pub(super) fn not_found(kind: ItemKind) -> AppError {
    AppError::NotFound(format!("{} not found", kind.label()))
}

/// Make sure the caller has a `users` row before writing anything that
/// references it.
pub(super) async fn register_author(state: &AppState, auth: &AuthUser) -> AppResult<()> {
    state
        .store()
        .upsert_user(User::from_principal(&auth.0))
        .await?;
    Ok(())
}

/// A write whose target was deleted after it was checked is a 404, not a 500.
fn missing_as(err: anyhow::Error, not_found: AppError) -> AppError {
    if StoreError::is_missing_reference(&err) {
        not_found
    } else {
        AppError::Internal(err)
    }
}

pub(super) async fn require_item(state: &AppState, kind: ItemKind, id: Uuid) -> AppResult<Item> {
    state
        .store()
        .find_item(kind, id)
        .await?
        .ok_or_else(|| not_found(kind))
}

/// Load the shaped view of an item that is known to exist.
async fn view_of(
    state: &AppState,
    kind: ItemKind,
    id: Uuid,
    viewer: &Viewer,
) -> AppResult<ItemView> {
    state
        .listing()
        .find(kind, id, viewer)
        .await?
        .ok_or_else(|| not_found(kind))
}

// =============================================================================
// Listing
// =============================================================================

pub(super) async fn list(
    state: &AppState,
    kind: ItemKind,
    viewer: &Viewer,
    query: &ListQuery,
) -> AppResult<Json<ListResponse>> {
    let page = state.listing().list(kind, query, viewer).await?;
    Ok(ListResponse::from_page(
        format!("Success get {}s", kind.label()),
        page,
    ))
}

pub(super) async fn search(
    state: &AppState,
    kind: ItemKind,
    viewer: &Viewer,
    query: &ListQuery,
) -> AppResult<Json<ListResponse>> {
    let page = state.listing().search(kind, query, viewer).await?;
    Ok(ListResponse::from_page(
        format!("Success search {}s", kind.label()),
        page,
    ))
}

/// Items liked by `id_user` (default: the caller) or bookmarked by the caller.
pub(super) async fn engaged(
    state: &AppState,
    kind: ItemKind,
    engagement: EngagementKind,
    auth: &AuthUser,
    query: &ListQuery,
) -> AppResult<Json<ListResponse>> {
    let target = match engagement {
        EngagementKind::Like => match query.id_user.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_id(raw, "user")?,
            _ => auth.0.user_id,
        },
        EngagementKind::Bookmark => auth.0.user_id,
    };

    let page = state
        .listing()
        .list_engaged(kind, engagement, target, query, &auth.viewer())
        .await?;

    Ok(ListResponse::from_page(
        format!("Success get {} {}s", engagement.past_tense(), kind.label()),
        page,
    ))
}

// =============================================================================
// Mutations
// =============================================================================

pub(super) async fn create(
    state: &AppState,
    auth: &AuthUser,
    input: NewItem,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    input.validate().map_err(AppError::BadRequest)?;

    if let Some(parent) = input.reply_to_id {
        require_item(state, ItemKind::Review, parent).await?;
    }
    if let Some(forum) = input.forum_id {
        require_item(state, ItemKind::Forum, forum).await?;
    }
    if let Some(subject) = input.subject_id
        && state.store().find_subject(subject).await?.is_none()
    {
        return Err(AppError::NotFound("subject not found".to_string()));
    }
    if let Some(lecturer) = input.lecturer_id
        && state.store().find_lecturer(lecturer).await?.is_none()
    {
        return Err(AppError::NotFound("lecturer not found".to_string()));
    }

    register_author(state, auth).await?;

    let kind = input.kind;
    let item = state.store().create_item(input).await.map_err(|e| {
        missing_as(
            e,
            AppError::NotFound("referenced content no longer exists".to_string()),
        )
    })?;
    tracing::info!(kind = kind.label(), id = %item.id, author = %item.author_id, "item created");

    let view = view_of(state, kind, item.id, &auth.viewer()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(format!("Success create {}", kind.label()), view),
    ))
}

pub(super) async fn update(
    state: &AppState,
    kind: ItemKind,
    auth: &AuthUser,
    id: Uuid,
    changes: ItemChanges,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let item = require_item(state, kind, id).await?;
    if item.author_id != auth.0.user_id {
        return Err(AppError::Forbidden(format!(
            "only the author can edit this {}",
            kind.label()
        )));
    }

    let changes = changes.normalized();
    changes.validate().map_err(AppError::BadRequest)?;

    state
        .store()
        .update_item(kind, id, changes)
        .await?
        .ok_or_else(|| not_found(kind))?;

    let view = view_of(state, kind, id, &auth.viewer()).await?;
    Ok(ApiResponse::ok(
        format!("Success update {}", kind.label()),
        view,
    ))
}

pub(super) async fn delete(
    state: &AppState,
    kind: ItemKind,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<Json<ApiResponse<Value>>> {
    let item = require_item(state, kind, id).await?;
    if item.author_id != auth.0.user_id {
        return Err(AppError::Forbidden(format!(
            "only the author can delete this {}",
            kind.label()
        )));
    }

    remove(state, kind, id).await
}

/// Delete an item regardless of ownership.
pub(super) async fn remove(
    state: &AppState,
    kind: ItemKind,
    id: Uuid,
) -> AppResult<Json<ApiResponse<Value>>> {
    if !state.store().delete_item(kind, id).await? {
        return Err(not_found(kind));
    }
    tracing::info!(kind = kind.label(), %id, "item deleted");

    Ok(ApiResponse::ok(
        format!("Success delete {}", kind.label()),
        json!({ "id": id }),
    ))
}

pub(super) async fn engage(
    state: &AppState,
    kind: ItemKind,
    engagement: EngagementKind,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemView>>)> {
    require_item(state, kind, id).await?;
    register_author(state, auth).await?;

    let edge = EngagementEdge {
        user_id: auth.0.user_id,
        kind: engagement,
        item_kind: kind,
        item_id: id,
    };
    let added = state
        .store()
        .add_engagement(edge)
        .await
        .map_err(|e| missing_as(e, not_found(kind)))?;
    if !added {
        return Err(AppError::Conflict(format!(
            "{} already {}",
            kind.label(),
            engagement.past_tense()
        )));
    }

    let view = view_of(state, kind, id, &auth.viewer()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            format!("Success {} {}", engagement.verb(), kind.label()),
            view,
        ),
    ))
}

pub(super) async fn disengage(
    state: &AppState,
    kind: ItemKind,
    engagement: EngagementKind,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    require_item(state, kind, id).await?;

    let edge = EngagementEdge {
        user_id: auth.0.user_id,
        kind: engagement,
        item_kind: kind,
        item_id: id,
    };
    if !state.store().remove_engagement(edge).await? {
        return Err(AppError::BadRequest(format!(
            "{} is not {}",
            kind.label(),
            engagement.past_tense()
        )));
    }

    let view = view_of(state, kind, id, &auth.viewer()).await?;
    Ok(ApiResponse::ok(
        format!("Success un{} {}", engagement.verb(), kind.label()),
        view,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reference_becomes_not_found() {
        let err =
            anyhow::Error::from(StoreError::MissingReference).context("failed to like review");
        let mapped = missing_as(err, not_found(ItemKind::Review));
        assert_eq!(mapped.status(), StatusCode::NOT_FOUND);
        assert_eq!(mapped.to_string(), "review not found");
    }

    #[test]
    fn other_store_failures_stay_internal() {
        let err = anyhow::anyhow!("connection reset");
        let mapped = missing_as(err, not_found(ItemKind::Forum));
        assert_eq!(mapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
