use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::database;
use crate::error::ApiError;
use crate::reports::{compose, ReportParams};
use crate::state::AppState;

/// GET /reports - filtered, sorted, paginated query over a category table
pub async fn reports(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let report = compose(&params)?;
    let rows = database::fetch_json_rows(&state.pool, &report.sql.query, &report.sql.params).await?;

    Ok(Json(json!({
        "success": true,
        "category": report.category,
        "page": report.page,
        "limit": report.limit,
        "data": rows,
    })))
}
