//! List query engine for reviews and forum threads.
//!
//! This module provides:
//! - Predicate: typed filter terms built from request parameters
//! - SortSpec: sort key and direction with stable tie-breaking
//! - Pager: page/limit normalization and page metadata
//! - EngagementIndex: like, bookmark and reply counts per item
//! - Visibility shaping: anonymous author redaction
//! - ListingQueryBuilder: SeaQuery-based SQL generation
//! - ListingService: runs a listing and assembles the response

mod aggregate;
mod ordering;
mod pager;
mod predicate;
mod query_builder;
mod service;
pub mod types;
pub mod visibility;

pub use aggregate::EngagementIndex;
pub use ordering::{SortDirection, SortKey, SortSpec};
pub use pager::{Pager, Window};
pub use predicate::{EdgeLookup, Predicate, Term};
pub use query_builder::ListingQueryBuilder;
pub use service::{ListPage, ListingService, SEARCH_LIMIT};
pub use types::{ListParams, ListQuery, PageInfo, Viewer};
pub use visibility::{AuthorView, ItemView, ParentView};
