//! Read-time author redaction.
//!
//! Anonymous items keep their real `author_id` in storage. Only the shaped
//! view replaces the author with a placeholder, and only for viewers other
//! than the author.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::types::Viewer;
use crate::models::{AuthorRecord, ItemKind, ItemRecord, ParentRecord};

/// Display name used in place of a hidden author.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Author as shown to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub id: Option<Uuid>,
    pub name: String,
    pub image: Option<String>,
}

impl AuthorView {
    pub fn placeholder() -> Self {
        Self {
            id: None,
            name: ANONYMOUS_NAME.to_string(),
            image: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}

/// Reveal `author` unless the item is anonymous and the viewer is someone else.
pub fn shape_author(author: &AuthorRecord, is_anonymous: bool, viewer: &Viewer) -> AuthorView {
    if is_anonymous && !viewer.is(author.id) {
        return AuthorView::placeholder();
    }
    AuthorView {
        id: Some(author.id),
        name: author.name.clone(),
        image: author.image.clone(),
    }
}

/// Preview of the review or forum a reply belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentView {
    pub kind: ItemKind,
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user: AuthorView,
}

/// A listed item as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: Uuid,
    pub subject_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub semester: Option<i32>,
    pub lecturer_id: Option<Uuid>,
    pub lecturer_name: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub forum_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub files: Vec<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: AuthorView,
    pub parent: Option<ParentView>,
    pub total_likes: i64,
    pub total_bookmarks: i64,
    pub total_replies: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

fn shape_parent(parent: ParentRecord, viewer: &Viewer) -> ParentView {
    ParentView {
        user: shape_author(&parent.author, parent.is_anonymous, viewer),
        kind: parent.kind,
        id: parent.id,
        title: parent.title,
        body: parent.body,
        created_at: parent.created_at,
    }
}

/// Project a record into the view seen by `viewer`.
pub fn shape_item(record: ItemRecord, viewer: &Viewer) -> ItemView {
    let user = shape_author(&record.author, record.is_anonymous, viewer);
    let parent = record.parent.map(|p| shape_parent(p, viewer));
    let a = record.aggregates;

    ItemView {
        id: record.id,
        subject_id: record.subject_id,
        subject_name: record.subject_name,
        semester: record.semester,
        lecturer_id: record.lecturer_id,
        lecturer_name: record.lecturer_name,
        reply_to_id: record.reply_to_id,
        forum_id: record.forum_id,
        title: record.title,
        body: record.body,
        files: record.files,
        is_anonymous: record.is_anonymous,
        created_at: record.created_at,
        updated_at: record.updated_at,
        user,
        parent,
        total_likes: a.total_likes,
        total_bookmarks: a.total_bookmarks,
        total_replies: a.total_replies,
        is_liked: a.is_liked,
        is_bookmarked: a.is_bookmarked,
    }
}
