//! Data access seams.
//!
//! Handlers and the listing engine talk to these traits, never to a pool
//! directly. [`postgres::PgStore`] backs production; [`memory::MemoryStore`]
//! is a complete in-process substitute used by tests.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::listing::{Predicate, SortSpec, Viewer, Window};
use crate::models::{
    EngagementEdge, Item, ItemChanges, ItemKind, ItemRecord, Lecturer, NewItem, NewReport,
    Report, Role, SiteStats, Subject, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store failures that callers act on instead of reporting as 500.
///
/// Returned inside the `anyhow::Error` of a store call; find it with
/// `downcast_ref`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A row the write points at (parent item, engaged item, subject,
    /// lecturer) no longer exists.
    #[error("referenced row does not exist")]
    MissingReference,
}

impl StoreError {
    /// True when `err` carries [`StoreError::MissingReference`].
    pub fn is_missing_reference(err: &anyhow::Error) -> bool {
        err.downcast_ref::<StoreError>() == Some(&StoreError::MissingReference)
    }
}

/// Read side of the listing engine.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Matching rows in `sort` order, restricted to `window` when given.
    async fn fetch(
        &self,
        kind: ItemKind,
        predicate: &Predicate,
        sort: &SortSpec,
        window: Option<Window>,
        viewer: &Viewer,
    ) -> Result<Vec<ItemRecord>>;

    /// Number of rows matching `predicate`.
    async fn count(&self, kind: ItemKind, predicate: &Predicate) -> Result<u64>;
}

/// Item and engagement mutations.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fails with [`StoreError::MissingReference`] when a referenced parent
    /// item, subject or lecturer is gone.
    async fn create_item(&self, input: NewItem) -> Result<Item>;

    async fn find_item(&self, kind: ItemKind, id: Uuid) -> Result<Option<Item>>;

    /// Returns `None` when the item does not exist.
    async fn update_item(
        &self,
        kind: ItemKind,
        id: Uuid,
        changes: ItemChanges,
    ) -> Result<Option<Item>>;

    /// Delete an item with its replies and engagement edges.
    async fn delete_item(&self, kind: ItemKind, id: Uuid) -> Result<bool>;

    /// Returns `false` when the edge already existed. Fails with
    /// [`StoreError::MissingReference`] when the item is gone.
    async fn add_engagement(&self, edge: EngagementEdge) -> Result<bool>;

    /// Returns `false` when there was no such edge.
    async fn remove_engagement(&self, edge: EngagementEdge) -> Result<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert the user, or refresh name and email from a newer token.
    ///
    /// Role and ban state of an existing account are left alone.
    async fn upsert_user(&self, user: User) -> Result<()>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// All accounts, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Flip the ban flag. Returns `None` when the user does not exist.
    async fn toggle_ban(&self, id: Uuid) -> Result<Option<User>>;

    /// Returns `None` when the user does not exist.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_subjects(&self) -> Result<Vec<Subject>>;

    async fn list_lecturers(&self) -> Result<Vec<Lecturer>>;

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>>;

    async fn find_lecturer(&self, id: Uuid) -> Result<Option<Lecturer>>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn create_report(&self, reporter_id: Uuid, input: NewReport) -> Result<Report>;

    async fn reports_by(&self, reporter_id: Uuid) -> Result<Vec<Report>>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store: ListingStore + ContentStore + UserStore + CatalogStore + ReportStore {
    /// True when the backing store answers.
    async fn is_healthy(&self) -> bool;

    /// Counts of users, reviews, forums and pending reports.
    async fn stats(&self) -> Result<SiteStats>;
}
