//! Engagement counts and viewer flags, derived from the edge set.
//!
//! Counts are grouped by item once per query and then looked up per row,
//! the in-memory counterpart of the pre-aggregated joins in
//! [`super::query_builder`].

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::predicate::EdgeLookup;
use super::types::Viewer;
use crate::models::{Aggregates, EngagementEdge, EngagementKind, Item, ItemKind};

type ItemKey = (ItemKind, Uuid);

/// Per-item engagement counts over a snapshot of edges and replies.
pub struct EngagementIndex<'a> {
    edges: &'a HashSet<EngagementEdge>,
    likes: HashMap<ItemKey, i64>,
    bookmarks: HashMap<ItemKey, i64>,
    replies: HashMap<ItemKey, i64>,
}

impl<'a> EngagementIndex<'a> {
    /// Group `edges` and the replies among `items` by target item.
    pub fn build<'i>(
        edges: &'a HashSet<EngagementEdge>,
        items: impl IntoIterator<Item = &'i Item>,
    ) -> Self {
        let mut likes = HashMap::new();
        let mut bookmarks = HashMap::new();
        for edge in edges {
            let counts = match edge.kind {
                EngagementKind::Like => &mut likes,
                EngagementKind::Bookmark => &mut bookmarks,
            };
            *counts.entry((edge.item_kind, edge.item_id)).or_insert(0) += 1;
        }

        let mut replies = HashMap::new();
        for item in items {
            if let Some(parent) = item.reply_to_id {
                *replies.entry((ItemKind::Review, parent)).or_insert(0) += 1;
            }
            if let Some(forum) = item.forum_id {
                *replies.entry((ItemKind::Forum, forum)).or_insert(0) += 1;
            }
        }

        Self {
            edges,
            likes,
            bookmarks,
            replies,
        }
    }

    /// Aggregates of one item as seen by `viewer`.
    pub fn project(&self, kind: ItemKind, id: Uuid, viewer: &Viewer) -> Aggregates {
        let key = (kind, id);
        let flag = |engagement| {
            viewer
                .user_id()
                .is_some_and(|user| self.has_edge(engagement, user, kind, id))
        };

        Aggregates {
            total_likes: self.likes.get(&key).copied().unwrap_or(0),
            total_bookmarks: self.bookmarks.get(&key).copied().unwrap_or(0),
            total_replies: self.replies.get(&key).copied().unwrap_or(0),
            is_liked: flag(EngagementKind::Like),
            is_bookmarked: flag(EngagementKind::Bookmark),
        }
    }
}

impl EdgeLookup for EngagementIndex<'_> {
    fn has_edge(
        &self,
        kind: EngagementKind,
        user_id: Uuid,
        item_kind: ItemKind,
        item_id: Uuid,
    ) -> bool {
        self.edges.contains(&EngagementEdge {
            user_id,
            kind,
            item_kind,
            item_id,
        })
    }
}
