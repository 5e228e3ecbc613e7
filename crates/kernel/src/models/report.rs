//! User reports against reviews or lecturers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status assigned to every new report.
pub const REPORT_STATUS_PENDING: &str = "pending";

/// A stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub review_id: Option<Uuid>,
    pub lecturer_id: Option<Uuid>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub report_type: String,
    pub body: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for filing a report.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    #[serde(rename = "type", default)]
    pub report_type: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub id_review: Option<Uuid>,
    #[serde(default)]
    pub id_lecturer: Option<Uuid>,
}

impl NewReport {
    pub fn validate(&self) -> Result<(), String> {
        if self.report_type.trim().is_empty() {
            return Err("report type is required".to_string());
        }
        if self.id_review.is_none() && self.id_lecturer.is_none() {
            return Err("id_review or id_lecturer is required".to_string());
        }
        Ok(())
    }
}
