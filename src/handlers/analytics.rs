//! Patent analytics: calendar-year bucketed counts.
//!
//! A patent with a null `date_granted` is pending: it appears in the filed
//! series for its filing year and never in the granted series.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize, FromRow)]
pub struct YearBucket {
    pub year: i32,
    pub count: i64,
}

const FILED_SQL: &str = "SELECT EXTRACT(YEAR FROM date_filed)::int4 AS year, COUNT(*) AS count \
                         FROM patents WHERE date_filed IS NOT NULL \
                         GROUP BY 1 ORDER BY 1";

const GRANTED_SQL: &str = "SELECT EXTRACT(YEAR FROM date_granted)::int4 AS year, COUNT(*) AS count \
                           FROM patents WHERE date_granted IS NOT NULL \
                           GROUP BY 1 ORDER BY 1";

async fn buckets(state: &AppState, sql: &str) -> Result<Vec<YearBucket>, ApiError> {
    let rows = sqlx::query_as::<_, YearBucket>(sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(rows)
}

/// GET /patents/analytics - filed and granted series side by side
pub async fn patents(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let filed = buckets(&state, FILED_SQL).await?;
    let granted = buckets(&state, GRANTED_SQL).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "filed": filed, "granted": granted }
    })))
}

/// GET /patents/analytics/filed
pub async fn patents_filed(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let filed = buckets(&state, FILED_SQL).await?;
    Ok(Json(json!({ "success": true, "data": filed })))
}

/// GET /patents/analytics/granted
pub async fn patents_granted(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let granted = buckets(&state, GRANTED_SQL).await?;
    Ok(Json(json!({ "success": true, "data": granted })))
}
