//! Listing service: runs the page and count queries and shapes the result.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::ordering::SortSpec;
use super::pager::Pager;
use super::predicate::{Predicate, Term};
use super::types::{ListParams, ListQuery, PageInfo, Viewer};
use super::visibility::{ItemView, shape_item};
use crate::error::{AppError, AppResult};
use crate::models::{EngagementKind, ItemKind};
use crate::store::ListingStore;

/// Page size of the keyword search endpoints.
pub const SEARCH_LIMIT: u32 = 20;

/// One page of shaped items with its pagination block.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub items: Vec<ItemView>,
    pub pagination: PageInfo,
}

/// Executes list requests against a [`ListingStore`].
///
/// Holds no per-request state; every call reads the store afresh.
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    max_limit: u32,
}

impl ListingService {
    pub fn new(store: Arc<dyn ListingStore>, max_limit: u32) -> Arc<Self> {
        Arc::new(Self { store, max_limit })
    }

    /// List items of `kind` filtered, sorted and paginated by `query`.
    pub async fn list(
        &self,
        kind: ItemKind,
        query: &ListQuery,
        viewer: &Viewer,
    ) -> AppResult<ListPage> {
        let params = ListParams::from_query(query);
        let predicate = Predicate::for_listing(kind, &params, viewer, Utc::now());
        let sort = SortSpec::resolve(query.sort_by.as_deref(), query.order.as_deref());
        let pager = self.pager(query);

        self.execute(kind, predicate, sort, pager, viewer).await
    }

    /// Keyword search over top-level items, newest first.
    ///
    /// Fails with a bad request before touching the store when no keyword
    /// was given.
    pub async fn search(
        &self,
        kind: ItemKind,
        query: &ListQuery,
        viewer: &Viewer,
    ) -> AppResult<ListPage> {
        let keyword = query
            .keyword()
            .ok_or_else(|| AppError::BadRequest("search keyword required".to_string()))?;

        let predicate = Predicate::for_search(kind, keyword);
        let page = Pager::from_raw(query.page.as_deref(), None, self.max_limit).page();
        let pager = Pager::new(page, SEARCH_LIMIT.min(self.max_limit));

        self.execute(kind, predicate, SortSpec::newest_first(), pager, viewer)
            .await
    }

    /// Items `user_id` has liked or bookmarked.
    pub async fn list_engaged(
        &self,
        kind: ItemKind,
        engagement: EngagementKind,
        user_id: Uuid,
        query: &ListQuery,
        viewer: &Viewer,
    ) -> AppResult<ListPage> {
        let term = match engagement {
            EngagementKind::Like => Term::LikedBy(user_id),
            EngagementKind::Bookmark => Term::BookmarkedBy(user_id),
        };
        let sort = SortSpec::resolve(query.sort_by.as_deref(), query.order.as_deref());
        let pager = self.pager(query);

        self.execute(kind, Predicate::all().and(term), sort, pager, viewer)
            .await
    }

    /// A single item as seen by `viewer`.
    pub async fn find(
        &self,
        kind: ItemKind,
        id: Uuid,
        viewer: &Viewer,
    ) -> AppResult<Option<ItemView>> {
        let predicate = Predicate::all().and(Term::Id(id));
        let rows = self
            .store
            .fetch(kind, &predicate, &SortSpec::newest_first(), None, viewer)
            .await
            .map_err(AppError::query)?;

        Ok(rows.into_iter().next().map(|row| shape_item(row, viewer)))
    }

    /// Every review replying to the given review or forum, newest first.
    pub async fn replies(
        &self,
        parent_kind: ItemKind,
        parent_id: Uuid,
        viewer: &Viewer,
    ) -> AppResult<Vec<ItemView>> {
        let term = match parent_kind {
            ItemKind::Review => Term::ReplyTo(parent_id),
            ItemKind::Forum => Term::InForum(parent_id),
        };
        let rows = self
            .store
            .fetch(
                ItemKind::Review,
                &Predicate::all().and(term),
                &SortSpec::newest_first(),
                None,
                viewer,
            )
            .await
            .map_err(AppError::query)?;

        Ok(rows.into_iter().map(|row| shape_item(row, viewer)).collect())
    }

    /// Run the page and count queries for one predicate and assemble a page.
    ///
    /// Both queries run concurrently. Either failing fails the whole call.
    pub async fn execute(
        &self,
        kind: ItemKind,
        predicate: Predicate,
        sort: SortSpec,
        pager: Pager,
        viewer: &Viewer,
    ) -> AppResult<ListPage> {
        let (rows, total) = tokio::try_join!(
            self.store
                .fetch(kind, &predicate, &sort, Some(pager.window()), viewer),
            self.store.count(kind, &predicate),
        )
        .map_err(AppError::query)?;

        tracing::debug!(
            kind = kind.label(),
            page = pager.page(),
            limit = pager.limit(),
            total,
            returned = rows.len(),
            "listing executed"
        );

        Ok(ListPage {
            items: rows.into_iter().map(|row| shape_item(row, viewer)).collect(),
            pagination: pager.page_info(total),
        })
    }

    fn pager(&self, query: &ListQuery) -> Pager {
        Pager::from_raw(
            query.page.as_deref(),
            query.limit.as_deref(),
            self.max_limit,
        )
    }
}
