//! Reviews and forum threads.
//!
//! Both are "items": authored, optionally anonymous posts that users can
//! like and bookmark. A review may reply to another review or to a forum
//! thread; a forum thread never has a parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum body length in characters.
pub const MAX_BODY_CHARS: usize = 1000;

/// Kind of a listable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Review,
    Forum,
}

impl ItemKind {
    /// Parse a path segment such as `review` or `forums`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "review" | "reviews" => Some(ItemKind::Review),
            "forum" | "forums" => Some(ItemKind::Forum),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Review => "review",
            ItemKind::Forum => "forum",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            ItemKind::Review => "reviews",
            ItemKind::Forum => "forums",
        }
    }

    /// Column holding the free text of an item.
    pub fn body_column(self) -> &'static str {
        match self {
            ItemKind::Review => "body",
            ItemKind::Forum => "description",
        }
    }

    /// Column of the edge tables referencing an item of this kind.
    pub fn edge_column(self) -> &'static str {
        match self {
            ItemKind::Review => "review_id",
            ItemKind::Forum => "forum_id",
        }
    }

    /// Column of `reviews` pointing at a parent of this kind.
    pub fn reply_column(self) -> &'static str {
        match self {
            ItemKind::Review => "reply_to_id",
            ItemKind::Forum => "forum_id",
        }
    }

    pub fn has_lecturer(self) -> bool {
        self == ItemKind::Review
    }
}

/// A persisted review or forum thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub kind: ItemKind,
    pub id: Uuid,
    pub author_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub lecturer_id: Option<Uuid>,
    pub reply_to_id: Option<Uuid>,
    pub forum_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub files: Vec<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub kind: ItemKind,
    pub author_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub lecturer_id: Option<Uuid>,
    pub reply_to_id: Option<Uuid>,
    pub forum_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub files: Vec<String>,
    pub is_anonymous: bool,
}

impl NewItem {
    /// Check field limits and parent rules. Returns a client-facing message.
    pub fn validate(&self) -> Result<(), String> {
        check_title(&self.title)?;
        check_body(&self.body)?;
        if self.body.trim().is_empty() {
            return Err(match self.kind {
                ItemKind::Review => "review body is required".to_string(),
                ItemKind::Forum => "forum description is required".to_string(),
            });
        }
        check_files(&self.files)?;

        match self.kind {
            ItemKind::Review => {
                if self.reply_to_id.is_some() && self.forum_id.is_some() {
                    return Err("a review can reply to a review or a forum, not both".to_string());
                }
                let top_level = self.reply_to_id.is_none() && self.forum_id.is_none();
                if top_level && self.subject_id.is_none() && self.lecturer_id.is_none() {
                    return Err("a review needs a subject or a lecturer".to_string());
                }
            }
            ItemKind::Forum => {
                if self.title.trim().is_empty() {
                    return Err("forum title is required".to_string());
                }
                if self.subject_id.is_none() {
                    return Err("forum subject is required".to_string());
                }
                if self.reply_to_id.is_some() || self.forum_id.is_some() || self.lecturer_id.is_some()
                {
                    return Err("a forum cannot have a parent or a lecturer".to_string());
                }
            }
        }

        Ok(())
    }
}

/// Partial update of an item. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemChanges {
    pub title: Option<String>,
    #[serde(alias = "description")]
    pub body: Option<String>,
    pub files: Option<Vec<String>>,
    pub is_anonymous: Option<bool>,
}

impl ItemChanges {
    /// Blank strings are treated as "unchanged".
    pub fn normalized(mut self) -> Self {
        self.title = self.title.filter(|t| !t.trim().is_empty());
        self.body = self.body.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(body) = &self.body {
            check_body(body)?;
        }
        if let Some(files) = &self.files {
            check_files(files)?;
        }
        Ok(())
    }

    pub fn apply(&self, item: &mut Item, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(body) = &self.body {
            item.body = body.clone();
        }
        if let Some(files) = &self.files {
            item.files = files.clone();
        }
        if let Some(is_anonymous) = self.is_anonymous {
            item.is_anonymous = is_anonymous;
        }
        item.updated_at = now;
    }
}

fn check_title(title: &str) -> Result<(), String> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("title must be at most {MAX_TITLE_CHARS} characters"));
    }
    Ok(())
}

fn check_body(body: &str) -> Result<(), String> {
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(format!("body must be at most {MAX_BODY_CHARS} characters"));
    }
    Ok(())
}

fn check_files(files: &[String]) -> Result<(), String> {
    let valid = files
        .iter()
        .all(|f| f.starts_with("http://") || f.starts_with("https://"));
    if !valid {
        return Err("files must be a list of URLs".to_string());
    }
    Ok(())
}

/// Author columns joined onto an item, before visibility shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

/// Minimal view of the item a review replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRecord {
    pub kind: ItemKind,
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRecord,
    pub is_anonymous: bool,
}

/// Engagement numbers and viewer flags attached to a listed item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub total_likes: i64,
    pub total_bookmarks: i64,
    pub total_replies: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

impl Aggregates {
    pub fn popularity(&self) -> i64 {
        self.total_likes + self.total_bookmarks
    }
}

/// An item with its joined names, parent preview and aggregates, as read
/// by the list query engine. Author identity is still raw here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub kind: ItemKind,
    pub id: Uuid,
    pub author: AuthorRecord,
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
    pub parent: Option<ParentRecord>,
    pub aggregates: Aggregates,
}
