//! Sort key and direction resolution.

use std::cmp::Ordering;

use crate::models::ItemRecord;

/// What a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    MostLiked,
    MostBookmarked,
    /// Likes plus bookmarks.
    MostPopular,
    MostReplied,
}

impl SortKey {
    /// Accepts the snake_case and camelCase spellings clients send.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "date" | "created_at" | "createdAt" => Some(SortKey::Date),
            "most_like" | "most_liked" | "mostLiked" | "mostLike" => Some(SortKey::MostLiked),
            "most_bookmark" | "most_bookmarked" | "mostBookmarked" | "mostBookmark" => {
                Some(SortKey::MostBookmarked)
            }
            "most_popular" | "mostPopular" => Some(SortKey::MostPopular),
            "most_reply" | "most_replied" | "mostReplied" | "mostReply" => {
                Some(SortKey::MostReplied)
            }
            _ => None,
        }
    }

    /// The aggregate value this key orders by, or `None` for `Date`.
    pub fn metric(self, row: &ItemRecord) -> Option<i64> {
        let a = &row.aggregates;
        match self {
            SortKey::Date => None,
            SortKey::MostLiked => Some(a.total_likes),
            SortKey::MostBookmarked => Some(a.total_bookmarks),
            SortKey::MostPopular => Some(a.popularity()),
            SortKey::MostReplied => Some(a.total_replies),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Only `asc` is ascending. Anything else, including absence, is `Desc`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(r) if r.trim().eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// A resolved ordering.
///
/// Ties on the primary key are broken by creation time descending, then by
/// id descending, so pages stay stable across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Resolve raw `sortBy` and `order` values. Unknown keys fall back to date.
    pub fn resolve(sort_by: Option<&str>, order: Option<&str>) -> Self {
        Self {
            key: sort_by.and_then(SortKey::parse).unwrap_or_default(),
            direction: SortDirection::parse(order),
        }
    }

    pub fn newest_first() -> Self {
        Self::default()
    }

    /// Comparator equivalent to the SQL `ORDER BY` of this sort.
    pub fn compare(&self, a: &ItemRecord, b: &ItemRecord) -> Ordering {
        let primary = match (self.key.metric(a), self.key.metric(b)) {
            (Some(x), Some(y)) => self.direction.apply(x.cmp(&y)),
            _ => self.direction.apply(a.created_at.cmp(&b.created_at)),
        };

        primary
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    }
}
