//! Domain models.

pub mod catalog;
pub mod engagement;
pub mod item;
pub mod report;
pub mod stats;
pub mod user;

pub use catalog::{Lecturer, Subject};
pub use engagement::{EngagementEdge, EngagementKind};
pub use item::{
    Aggregates, AuthorRecord, Item, ItemChanges, ItemKind, ItemRecord, NewItem, ParentRecord,
};
pub use report::{NewReport, Report};
pub use stats::SiteStats;
pub use user::{Principal, PublicProfile, Role, User};
