//! Site-wide counters for the admin dashboard.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub total_users: u64,
    pub total_reviews: u64,
    pub total_forums: u64,
    pub pending_reports: u64,
}
