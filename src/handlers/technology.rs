//! Aggregated technology detail: the root row plus all child tables in one
//! response, for the detail dashboard.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::resources::{
    repository, QUALIFICATION_HW, QUALIFICATION_SW, TECHNOLOGIES, TECHNOLOGY_SPECS, VERSIONS,
};
use crate::state::AppState;

/// GET /technologies/details/:id - technology with versions, specs, and
/// hardware/software qualification rows
pub async fn details(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 on the root row before touching the children.
    let technology = repository::get(&state.pool, &TECHNOLOGIES, id).await?;

    let versions = repository::list(&state.pool, &VERSIONS, Some(id)).await?;
    let specs = repository::list(&state.pool, &TECHNOLOGY_SPECS, Some(id)).await?;
    let qualification_hw = repository::list(&state.pool, &QUALIFICATION_HW, Some(id)).await?;
    let qualification_sw = repository::list(&state.pool, &QUALIFICATION_SW, Some(id)).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "technology": technology,
            "versions": versions,
            "specs": specs,
            "qualification_hw": qualification_hw,
            "qualification_sw": qualification_sw,
        }
    })))
}
