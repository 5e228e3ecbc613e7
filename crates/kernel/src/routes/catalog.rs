//! Subjects and lecturers, the reference data behind listing filters.

use axum::{Json, Router, extract::State, routing::get};

use super::envelope::ApiResponse;
use crate::error::AppResult;
use crate::models::{Lecturer, Subject};
use crate::state::AppState;

/// GET /api/subjects
async fn list_subjects(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Subject>>>> {
    let subjects = state.store().list_subjects().await?;
    Ok(ApiResponse::ok("Success get subjects", subjects))
}

/// GET /api/lecturers
async fn list_lecturers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Lecturer>>>> {
    let lecturers = state.store().list_lecturers().await?;
    Ok(ApiResponse::ok("Success get lecturers", lecturers))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/subjects", get(list_subjects))
        .route("/api/lecturers", get(list_lecturers))
}
