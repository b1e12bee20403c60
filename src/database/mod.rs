//! Pool construction and dynamic-row helpers.
//!
//! Rows for the catalogue tables are fetched through `row_to_json`
//! subselects and handled as `serde_json::Value`, so one repository serves
//! every table. Dates render as `YYYY-MM-DD` strings on the way out.

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::ApiError;

/// Build the connection pool. Connections are established lazily, so startup
/// does not require the store to be reachable; `/health` reports its state.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, ApiError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy(&config.url)
        .map_err(|e| {
            tracing::error!("invalid database configuration: {}", e);
            ApiError::internal("invalid database configuration")
        })
}

pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Fetch all rows of a query as JSON objects. The caller wraps its SELECT in
/// `row_to_json`; parameters are bound positionally.
pub async fn fetch_json_rows(
    pool: &PgPool,
    sql: &str,
    params: &[Value],
) -> Result<Vec<Value>, ApiError> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    let rows = query.fetch_all(pool).await?;
    rows.into_iter()
        .map(|row| row.try_get::<Value, _>("row").map_err(ApiError::from))
        .collect()
}

/// Fetch at most one row as a JSON object.
pub async fn fetch_json_optional(
    pool: &PgPool,
    sql: &str,
    params: &[Value],
) -> Result<Option<Value>, ApiError> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    let row = query.fetch_optional(pool).await?;
    match row {
        Some(row) => {
            let value = row.try_get::<Value, _>("row").map_err(ApiError::from)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Execute a statement and return the affected-row count.
pub async fn execute(pool: &PgPool, sql: &str, params: &[Value]) -> Result<u64, ApiError> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Execute an INSERT with `RETURNING id` and return the generated id.
pub async fn execute_returning_id(
    pool: &PgPool,
    sql: &str,
    params: &[Value],
) -> Result<i64, ApiError> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    for param in params {
        query = bind_value_scalar(query, param);
    }
    let id = query.fetch_one(pool).await?;
    Ok(id)
}

/// Bind a JSON value to the next positional parameter. Integers stay i64,
/// other numbers become f64, strings bind as text (SQL-side casts handle
/// dates), null binds as NULL text.
fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        other => q.bind(other.clone()),
    }
}

fn bind_value_scalar<'q, O>(
    q: sqlx::query::QueryScalar<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, O, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        other => q.bind(other.clone()),
    }
}
