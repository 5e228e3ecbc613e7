//! Report routes.
//!
//! Any signed-in user can report a review or a lecturer. Reports are only
//! listed back to the user who filed them.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use super::envelope::ApiResponse;
use super::items;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{ItemKind, NewReport, Report};
use crate::state::AppState;

/// POST /api/reports
async fn create_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<NewReport>,
) -> AppResult<(StatusCode, Json<ApiResponse<Report>>)> {
    input.validate().map_err(AppError::BadRequest)?;

    if let Some(review) = input.id_review {
        items::require_item(&state, ItemKind::Review, review).await?;
    }
    if let Some(lecturer) = input.id_lecturer
        && state.store().find_lecturer(lecturer).await?.is_none()
    {
        return Err(AppError::NotFound("lecturer not found".to_string()));
    }

    items::register_author(&state, &auth).await?;
    let report = state.store().create_report(auth.0.user_id, input).await?;
    tracing::info!(report_id = %report.id, reporter = %report.reporter_id, "report filed");

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Success create report", report),
    ))
}

/// GET /api/reports
async fn list_reports(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Report>>>> {
    let reports = state.store().reports_by(auth.0.user_id).await?;
    Ok(ApiResponse::ok("Success get reports", reports))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reports", get(list_reports).post(create_report))
}
