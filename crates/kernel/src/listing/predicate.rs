//! Typed filter terms for list queries.
//!
//! A [`Predicate`] is a conjunction of [`Term`]s. The same value drives the
//! page query and the count query, and can be evaluated in memory against an
//! [`ItemRecord`] without a database.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{ListParams, Parsed, Viewer};
use crate::models::{EngagementKind, ItemKind, ItemRecord};

/// Answers whether a user has liked or bookmarked an item.
pub trait EdgeLookup {
    fn has_edge(&self, kind: EngagementKind, user_id: Uuid, item_kind: ItemKind, item_id: Uuid)
    -> bool;
}

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Item has no parent review or forum.
    TopLevelOnly,
    Id(Uuid),
    /// Case-insensitive substring of title, body, subject or lecturer name.
    Search(String),
    CreatedBetween {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    CreatedSince(DateTime<Utc>),
    /// Items by an author. Anonymous items only when `include_anonymous`.
    Author {
        author_id: Uuid,
        include_anonymous: bool,
    },
    Subject(Uuid),
    Lecturer(Uuid),
    ReplyTo(Uuid),
    InForum(Uuid),
    LikedBy(Uuid),
    BookmarkedBy(Uuid),
    /// Matches no row.
    Nothing,
}

impl Term {
    fn matches(&self, row: &ItemRecord, edges: &dyn EdgeLookup) -> bool {
        match self {
            Term::TopLevelOnly => row.reply_to_id.is_none() && row.forum_id.is_none(),
            Term::Id(id) => row.id == *id,
            Term::Search(needle) => {
                let needle = needle.to_lowercase();
                let hit = |text: Option<&str>| {
                    text.is_some_and(|t| t.to_lowercase().contains(&needle))
                };
                hit(Some(row.title.as_str()))
                    || hit(Some(row.body.as_str()))
                    || hit(row.subject_name.as_deref())
                    || hit(row.lecturer_name.as_deref())
            }
            Term::CreatedBetween { start, end } => {
                row.created_at >= *start && row.created_at <= *end
            }
            Term::CreatedSince(since) => row.created_at >= *since,
            Term::Author {
                author_id,
                include_anonymous,
            } => row.author.id == *author_id && (*include_anonymous || !row.is_anonymous),
            Term::Subject(id) => row.subject_id == Some(*id),
            Term::Lecturer(id) => row.lecturer_id == Some(*id),
            Term::ReplyTo(id) => row.reply_to_id == Some(*id),
            Term::InForum(id) => row.forum_id == Some(*id),
            Term::LikedBy(user) => edges.has_edge(EngagementKind::Like, *user, row.kind, row.id),
            Term::BookmarkedBy(user) => {
                edges.has_edge(EngagementKind::Bookmark, *user, row.kind, row.id)
            }
            Term::Nothing => false,
        }
    }
}

/// Conjunction of filter terms. The empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True when some term can never match.
    pub fn is_unsatisfiable(&self) -> bool {
        self.terms.contains(&Term::Nothing)
    }

    pub fn matches(&self, row: &ItemRecord, edges: &dyn EdgeLookup) -> bool {
        self.terms.iter().all(|term| term.matches(row, edges))
    }

    /// Build the filter for a list request.
    ///
    /// Replies are left out unless the request filters by author, so a
    /// profile page shows everything the author wrote. Malformed dates or
    /// ids turn into [`Term::Nothing`].
    pub fn for_listing(
        kind: ItemKind,
        params: &ListParams,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> Self {
        let mut predicate = Predicate::all();

        if kind == ItemKind::Review && params.author_id.is_none() {
            predicate = predicate.and(Term::TopLevelOnly);
        }

        if let Some(keyword) = &params.search {
            predicate = predicate.and(Term::Search(keyword.clone()));
        }

        match params.date_range {
            Some(Parsed::Valid(range)) => {
                let (start, end) = range.bounds();
                predicate = predicate.and(Term::CreatedBetween { start, end });
            }
            Some(Parsed::Malformed) => predicate = predicate.and(Term::Nothing),
            None => {
                if let Some(window) = params.recent {
                    predicate = predicate.and(Term::CreatedSince(window.since(now)));
                }
            }
        }

        match params.author_id {
            Some(Parsed::Valid(author_id)) => {
                predicate = predicate.and(Term::Author {
                    author_id,
                    include_anonymous: viewer.is(author_id),
                });
            }
            Some(Parsed::Malformed) => predicate = predicate.and(Term::Nothing),
            None => {}
        }

        match params.subject_id {
            Some(Parsed::Valid(id)) => predicate = predicate.and(Term::Subject(id)),
            Some(Parsed::Malformed) => predicate = predicate.and(Term::Nothing),
            None => {}
        }

        if kind.has_lecturer() {
            match params.lecturer_id {
                Some(Parsed::Valid(id)) => predicate = predicate.and(Term::Lecturer(id)),
                Some(Parsed::Malformed) => predicate = predicate.and(Term::Nothing),
                None => {}
            }
        }

        predicate
    }

    /// Top-level items matching a keyword, used by the search endpoints.
    pub fn for_search(kind: ItemKind, keyword: &str) -> Self {
        let predicate = Predicate::all().and(Term::Search(keyword.to_string()));
        if kind == ItemKind::Review {
            predicate.and(Term::TopLevelOnly)
        } else {
            predicate
        }
    }
}
