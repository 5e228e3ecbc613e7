//! Like and bookmark edges between users and items.

use serde::Serialize;
use uuid::Uuid;

use super::item::ItemKind;

/// The two kinds of engagement a user can leave on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Like,
    Bookmark,
}

impl EngagementKind {
    /// Edge table holding this engagement for items of `kind`.
    pub fn table(self, kind: ItemKind) -> &'static str {
        match (self, kind) {
            (EngagementKind::Like, ItemKind::Review) => "review_likes",
            (EngagementKind::Like, ItemKind::Forum) => "forum_likes",
            (EngagementKind::Bookmark, ItemKind::Review) => "review_bookmarks",
            (EngagementKind::Bookmark, ItemKind::Forum) => "forum_bookmarks",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            EngagementKind::Like => "like",
            EngagementKind::Bookmark => "bookmark",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            EngagementKind::Like => "liked",
            EngagementKind::Bookmark => "bookmarked",
        }
    }
}

/// A single (user, item) engagement. At most one exists per combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngagementEdge {
    pub user_id: Uuid,
    pub kind: EngagementKind,
    pub item_kind: ItemKind,
    pub item_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_tables() {
        assert_eq!(
            EngagementKind::Like.table(ItemKind::Review),
            "review_likes"
        );
        assert_eq!(
            EngagementKind::Bookmark.table(ItemKind::Forum),
            "forum_bookmarks"
        );
    }
}
