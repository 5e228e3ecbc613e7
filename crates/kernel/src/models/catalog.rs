//! Subjects and lecturers that reviews and forums are attached to.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A course subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub semester: Option<i32>,
}

/// A lecturer that can be reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lecturer {
    pub id: Uuid,
    pub name: String,
    pub faculty: Option<String>,
}
