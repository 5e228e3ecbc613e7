//! Listing query builder using SeaQuery.
//!
//! Generates the page query and the count query for one [`Predicate`].
//! Both statements go through [`ListingQueryBuilder::add_scope`], so the
//! joins and `WHERE` clause that decide which rows match are always the
//! same for the data and for `totalData`.
//!
//! Engagement counts come from subqueries grouped by item id and joined
//! once, instead of one correlated subquery per column and row.

use sea_query::{
    Alias, Asterisk, Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr,
};
use uuid::Uuid;

use super::ordering::{SortDirection, SortKey, SortSpec};
use super::pager::Window;
use super::predicate::{Predicate, Term};
use super::types::Viewer;
use crate::models::{EngagementKind, ItemKind};

/// Alias of the listed table.
const ITEM: &str = "i";

fn col(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(column)))
}

/// Escape `%`, `_` and `\` so user text is matched literally by ILIKE.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds SQL for listing one item kind.
pub struct ListingQueryBuilder<'a> {
    kind: ItemKind,
    predicate: &'a Predicate,
    sort: SortSpec,
    viewer: Viewer,
}

impl<'a> ListingQueryBuilder<'a> {
    pub fn new(kind: ItemKind, predicate: &'a Predicate, sort: SortSpec, viewer: Viewer) -> Self {
        Self {
            kind,
            predicate,
            sort,
            viewer,
        }
    }

    /// Build the SELECT for one page, or for all matching rows when `window`
    /// is `None`.
    pub fn build_page(&self, window: Option<Window>) -> String {
        let mut query = Query::select();

        self.add_columns(&mut query);
        self.add_scope(&mut query);
        self.add_aggregates(&mut query);
        self.add_parent(&mut query);
        self.add_sorts(&mut query);

        if let Some(window) = window {
            query.limit(window.limit);
            query.offset(window.offset);
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// Build the COUNT query over the same scope as [`Self::build_page`].
    pub fn build_count(&self) -> String {
        let mut query = Query::select();

        query.expr_as(Expr::col(Asterisk).count(), Alias::new("total"));
        self.add_scope(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// FROM, the joins filters may reference, and WHERE.
    fn add_scope(&self, query: &mut SelectStatement) {
        query.from_as(Alias::new(self.kind.table()), Alias::new(ITEM));

        query.join_as(
            JoinType::LeftJoin,
            Alias::new("users"),
            Alias::new("u"),
            col("u", "id").equals((Alias::new(ITEM), Alias::new("author_id"))),
        );
        query.join_as(
            JoinType::LeftJoin,
            Alias::new("subjects"),
            Alias::new("s"),
            col("s", "id").equals((Alias::new(ITEM), Alias::new("subject_id"))),
        );
        if self.kind.has_lecturer() {
            query.join_as(
                JoinType::LeftJoin,
                Alias::new("lecturers"),
                Alias::new("l"),
                col("l", "id").equals((Alias::new(ITEM), Alias::new("lecturer_id"))),
            );
        }

        for term in self.predicate.terms() {
            if let Some(condition) = self.term_condition(term) {
                query.and_where(condition);
            }
        }
    }

    fn term_condition(&self, term: &Term) -> Option<SimpleExpr> {
        let expr = match term {
            Term::TopLevelOnly => {
                if self.kind != ItemKind::Review {
                    return None;
                }
                col(ITEM, "reply_to_id")
                    .is_null()
                    .and(col(ITEM, "forum_id").is_null())
            }
            Term::Id(id) => col(ITEM, "id").eq(*id),
            Term::Search(text) => {
                let pattern = format!("%{}%", escape_like_wildcards(text));
                match self.kind {
                    ItemKind::Review => Expr::cust_with_values(
                        "(i.title ILIKE $1 OR i.body ILIKE $2 OR s.name ILIKE $3 OR l.name ILIKE $4)",
                        [pattern.clone(), pattern.clone(), pattern.clone(), pattern],
                    ),
                    ItemKind::Forum => Expr::cust_with_values(
                        "(i.title ILIKE $1 OR i.description ILIKE $2 OR s.name ILIKE $3)",
                        [pattern.clone(), pattern.clone(), pattern],
                    ),
                }
            }
            Term::CreatedBetween { start, end } => col(ITEM, "created_at")
                .gte(*start)
                .and(col(ITEM, "created_at").lte(*end)),
            Term::CreatedSince(since) => col(ITEM, "created_at").gte(*since),
            Term::Author {
                author_id,
                include_anonymous,
            } => {
                let by_author = col(ITEM, "author_id").eq(*author_id);
                if *include_anonymous {
                    by_author
                } else {
                    by_author.and(col(ITEM, "is_anonymous").eq(false))
                }
            }
            Term::Subject(id) => col(ITEM, "subject_id").eq(*id),
            Term::Lecturer(id) => {
                if !self.kind.has_lecturer() {
                    // Forums carry no lecturer
                    return Some(Expr::cust("FALSE"));
                }
                col(ITEM, "lecturer_id").eq(*id)
            }
            Term::ReplyTo(_) | Term::InForum(_) if self.kind == ItemKind::Forum => {
                Expr::cust("FALSE")
            }
            Term::ReplyTo(id) => col(ITEM, "reply_to_id").eq(*id),
            Term::InForum(id) => col(ITEM, "forum_id").eq(*id),
            Term::LikedBy(user) => self.edge_exists(EngagementKind::Like, *user),
            Term::BookmarkedBy(user) => self.edge_exists(EngagementKind::Bookmark, *user),
            // Restrict rather than widen query results
            Term::Nothing => Expr::cust("FALSE"),
        };
        Some(expr)
    }

    fn edge_exists(&self, engagement: EngagementKind, user: Uuid) -> SimpleExpr {
        let sql = format!(
            "EXISTS (SELECT 1 FROM {table} e WHERE e.{key} = i.id AND e.user_id = $1)",
            table = engagement.table(self.kind),
            key = self.kind.edge_column(),
        );
        Expr::cust_with_values(sql, [user])
    }

    fn add_columns(&self, query: &mut SelectStatement) {
        query.expr_as(col(ITEM, "id"), Alias::new("id"));
        query.expr_as(col(ITEM, "author_id"), Alias::new("author_id"));
        query.expr_as(col("u", "name"), Alias::new("author_name"));
        query.expr_as(col("u", "image"), Alias::new("author_image"));
        query.expr_as(col(ITEM, "subject_id"), Alias::new("subject_id"));
        query.expr_as(col("s", "name"), Alias::new("subject_name"));
        query.expr_as(col("s", "semester"), Alias::new("semester"));

        match self.kind {
            ItemKind::Review => {
                query.expr_as(col(ITEM, "lecturer_id"), Alias::new("lecturer_id"));
                query.expr_as(col("l", "name"), Alias::new("lecturer_name"));
                query.expr_as(col(ITEM, "reply_to_id"), Alias::new("reply_to_id"));
                query.expr_as(col(ITEM, "forum_id"), Alias::new("forum_id"));
            }
            ItemKind::Forum => {
                query.expr_as(Expr::cust("NULL::uuid"), Alias::new("lecturer_id"));
                query.expr_as(Expr::cust("NULL::text"), Alias::new("lecturer_name"));
                query.expr_as(Expr::cust("NULL::uuid"), Alias::new("reply_to_id"));
                query.expr_as(Expr::cust("NULL::uuid"), Alias::new("forum_id"));
            }
        }

        query.expr_as(col(ITEM, "title"), Alias::new("title"));
        query.expr_as(col(ITEM, self.kind.body_column()), Alias::new("body"));
        query.expr_as(col(ITEM, "files"), Alias::new("files"));
        query.expr_as(col(ITEM, "is_anonymous"), Alias::new("is_anonymous"));
        query.expr_as(col(ITEM, "created_at"), Alias::new("created_at"));
        query.expr_as(col(ITEM, "updated_at"), Alias::new("updated_at"));
    }

    /// Join pre-aggregated engagement counts and the viewer's own edges.
    fn add_aggregates(&self, query: &mut SelectStatement) {
        let key = self.kind.edge_column();
        let on = |alias: &str| {
            col(alias, "item_id").equals((Alias::new(ITEM), Alias::new("id")))
        };

        query.join_subquery(
            JoinType::LeftJoin,
            count_by(EngagementKind::Like.table(self.kind), key),
            Alias::new("lk"),
            on("lk"),
        );
        query.join_subquery(
            JoinType::LeftJoin,
            count_by(EngagementKind::Bookmark.table(self.kind), key),
            Alias::new("bk"),
            on("bk"),
        );
        query.join_subquery(
            JoinType::LeftJoin,
            count_by(ItemKind::Review.table(), self.kind.reply_column()),
            Alias::new("rp"),
            on("rp"),
        );

        query.expr_as(Expr::cust("COALESCE(lk.total, 0)"), Alias::new("total_likes"));
        query.expr_as(Expr::cust("COALESCE(bk.total, 0)"), Alias::new("total_bookmarks"));
        query.expr_as(Expr::cust("COALESCE(rp.total, 0)"), Alias::new("total_replies"));

        match self.viewer.user_id() {
            Some(user) => {
                query.join_subquery(
                    JoinType::LeftJoin,
                    edges_of(EngagementKind::Like.table(self.kind), key, user),
                    Alias::new("vl"),
                    on("vl"),
                );
                query.join_subquery(
                    JoinType::LeftJoin,
                    edges_of(EngagementKind::Bookmark.table(self.kind), key, user),
                    Alias::new("vb"),
                    on("vb"),
                );
                query.expr_as(Expr::cust("vl.item_id IS NOT NULL"), Alias::new("is_liked"));
                query.expr_as(Expr::cust("vb.item_id IS NOT NULL"), Alias::new("is_bookmarked"));
            }
            None => {
                query.expr_as(Expr::cust("FALSE"), Alias::new("is_liked"));
                query.expr_as(Expr::cust("FALSE"), Alias::new("is_bookmarked"));
            }
        }
    }

    /// Parent preview columns. Only reviews have a parent.
    fn add_parent(&self, query: &mut SelectStatement) {
        if self.kind != ItemKind::Review {
            for (sql, alias) in [
                ("NULL::text", "parent_kind"),
                ("NULL::uuid", "parent_id"),
                ("NULL::text", "parent_title"),
                ("NULL::text", "parent_body"),
                ("NULL::timestamptz", "parent_created_at"),
                ("NULL::uuid", "parent_author_id"),
                ("NULL::text", "parent_author_name"),
                ("NULL::text", "parent_author_image"),
                ("NULL::boolean", "parent_is_anonymous"),
            ] {
                query.expr_as(Expr::cust(sql), Alias::new(alias));
            }
            return;
        }

        for (table, alias, column) in [
            ("reviews", "pr", "reply_to_id"),
            ("forums", "pf", "forum_id"),
        ] {
            query.join_as(
                JoinType::LeftJoin,
                Alias::new(table),
                Alias::new(alias),
                col(alias, "id").equals((Alias::new(ITEM), Alias::new(column))),
            );
        }
        for (users, parent) in [("pru", "pr"), ("pfu", "pf")] {
            query.join_as(
                JoinType::LeftJoin,
                Alias::new("users"),
                Alias::new(users),
                col(users, "id").equals((Alias::new(parent), Alias::new("author_id"))),
            );
        }

        for (sql, alias) in [
            (
                "CASE WHEN pr.id IS NOT NULL THEN 'review' WHEN pf.id IS NOT NULL THEN 'forum' END",
                "parent_kind",
            ),
            ("COALESCE(pr.id, pf.id)", "parent_id"),
            ("COALESCE(pr.title, pf.title)", "parent_title"),
            ("COALESCE(pr.body, pf.description)", "parent_body"),
            ("COALESCE(pr.created_at, pf.created_at)", "parent_created_at"),
            ("COALESCE(pr.author_id, pf.author_id)", "parent_author_id"),
            ("COALESCE(pru.name, pfu.name)", "parent_author_name"),
            ("COALESCE(pru.image, pfu.image)", "parent_author_image"),
            ("COALESCE(pr.is_anonymous, pf.is_anonymous)", "parent_is_anonymous"),
        ] {
            query.expr_as(Expr::cust(sql), Alias::new(alias));
        }
    }

    fn add_sorts(&self, query: &mut SelectStatement) {
        let order = match self.sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        let metric = match self.sort.key {
            SortKey::Date => None,
            SortKey::MostLiked => Some("COALESCE(lk.total, 0)"),
            SortKey::MostBookmarked => Some("COALESCE(bk.total, 0)"),
            SortKey::MostPopular => Some("COALESCE(lk.total, 0) + COALESCE(bk.total, 0)"),
            SortKey::MostReplied => Some("COALESCE(rp.total, 0)"),
        };

        match metric {
            Some(sql) => {
                query.order_by_expr(Expr::cust(sql), order);
                query.order_by((Alias::new(ITEM), Alias::new("created_at")), Order::Desc);
            }
            None => {
                query.order_by((Alias::new(ITEM), Alias::new("created_at")), order);
            }
        }
        query.order_by((Alias::new(ITEM), Alias::new("id")), Order::Desc);
    }
}

/// `SELECT key AS item_id, COUNT(*) AS total FROM table GROUP BY key`
fn count_by(table: &str, key: &str) -> SelectStatement {
    Query::select()
        .expr_as(Expr::col(Alias::new(key)), Alias::new("item_id"))
        .expr_as(Expr::col(Asterisk).count(), Alias::new("total"))
        .from(Alias::new(table))
        .and_where(Expr::col(Alias::new(key)).is_not_null())
        .group_by_col(Alias::new(key))
        .to_owned()
}

/// Items of `table` that `user` has an edge to.
fn edges_of(table: &str, key: &str, user: Uuid) -> SelectStatement {
    Query::select()
        .expr_as(Expr::col(Alias::new(key)), Alias::new("item_id"))
        .from(Alias::new(table))
        .and_where(Expr::col(Alias::new("user_id")).eq(user))
        .to_owned()
}
