//! Generic CRUD repository over the resource registry.
//!
//! One implementation serves every table: SQL text is assembled from the
//! static `ResourceSpec` (never from request input), and all values are
//! bound as positional parameters. Submitted fields pass through a
//! normalization step first: empty strings become null, numeric strings are
//! coerced, and date fields must be `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::database;
use crate::error::ApiError;
use crate::resources::{ColumnKind, ResourceSpec};

/// List rows, optionally filtered by the resource's parent foreign key.
pub async fn list(
    pool: &PgPool,
    spec: &ResourceSpec,
    parent: Option<i64>,
) -> Result<Vec<Value>, ApiError> {
    let (sql, params) = build_list(spec, parent);
    database::fetch_json_rows(pool, &sql, &params).await
}

/// Fetch a single row by primary key.
pub async fn get(pool: &PgPool, spec: &ResourceSpec, id: i64) -> Result<Value, ApiError> {
    let sql = build_get(spec);
    database::fetch_json_optional(pool, &sql, &[Value::from(id)])
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", spec.label(), id)))
}

/// Insert a row and return the generated id merged with the normalized
/// submitted fields.
pub async fn create(
    pool: &PgPool,
    spec: &ResourceSpec,
    body: &Value,
) -> Result<Value, ApiError> {
    let fields = normalize(spec, body)?;
    require_required(spec, &fields)?;

    let (sql, params) = build_insert(spec, &fields);
    let id = database::execute_returning_id(pool, &sql, &params).await?;

    let mut out = fields;
    out.insert(spec.primary_key.to_string(), Value::from(id));
    Ok(Value::Object(out))
}

/// Partial update: only submitted known columns are written. An empty
/// effective field set is a validation error and never reaches the store.
pub async fn update(
    pool: &PgPool,
    spec: &ResourceSpec,
    id: i64,
    body: &Value,
) -> Result<Value, ApiError> {
    let fields = normalize(spec, body)?;
    if fields.is_empty() {
        return Err(ApiError::validation("no fields to update"));
    }
    for column in spec.columns.iter().filter(|c| c.required) {
        if matches!(fields.get(column.name), Some(Value::Null)) {
            return Err(ApiError::validation(format!(
                "field '{}' cannot be cleared",
                column.name
            )));
        }
    }

    let (sql, params) = build_update(spec, &fields, id);
    let affected = database::execute(pool, &sql, &params).await?;
    if affected == 0 {
        return Err(ApiError::not_found(format!("{} {} not found", spec.label(), id)));
    }

    let mut out = fields;
    out.insert(spec.primary_key.to_string(), Value::from(id));
    Ok(Value::Object(out))
}

/// Hard delete. Referential-constraint rejections surface as `Conflict`.
pub async fn delete(pool: &PgPool, spec: &ResourceSpec, id: i64) -> Result<(), ApiError> {
    let sql = format!(
        "DELETE FROM \"{}\" WHERE \"{}\" = $1",
        spec.table, spec.primary_key
    );
    let affected = database::execute(pool, &sql, &[Value::from(id)]).await?;
    if affected == 0 {
        return Err(ApiError::not_found(format!("{} {} not found", spec.label(), id)));
    }
    Ok(())
}

// --- SQL assembly (pure, unit-tested) ---

fn build_list(spec: &ResourceSpec, parent: Option<i64>) -> (String, Vec<Value>) {
    match (spec.parent_key, parent) {
        (Some(parent_key), Some(parent_id)) => (
            format!(
                "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE \"{}\" = $1 ORDER BY \"{}\") t",
                spec.table, parent_key, spec.primary_key
            ),
            vec![Value::from(parent_id)],
        ),
        _ => (
            format!(
                "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" ORDER BY \"{}\") t",
                spec.table, spec.primary_key
            ),
            vec![],
        ),
    }
}

fn build_get(spec: &ResourceSpec) -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE \"{}\" = $1) t",
        spec.table, spec.primary_key
    )
}

fn build_insert(spec: &ResourceSpec, fields: &Map<String, Value>) -> (String, Vec<Value>) {
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();

    // Iterate the spec, not the map, for a deterministic column order.
    for column in spec.columns {
        if let Some(value) = fields.get(column.name) {
            params.push(value.clone());
            columns.push(format!("\"{}\"", column.name));
            placeholders.push(placeholder(column.kind, params.len()));
        }
    }

    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING \"{}\"",
        spec.table,
        columns.join(", "),
        placeholders.join(", "),
        spec.primary_key
    );
    (sql, params)
}

fn build_update(spec: &ResourceSpec, fields: &Map<String, Value>, id: i64) -> (String, Vec<Value>) {
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for column in spec.columns {
        if let Some(value) = fields.get(column.name) {
            params.push(value.clone());
            assignments.push(format!(
                "\"{}\" = {}",
                column.name,
                placeholder(column.kind, params.len())
            ));
        }
    }

    params.push(Value::from(id));
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"{}\" = ${}",
        spec.table,
        assignments.join(", "),
        spec.primary_key,
        params.len()
    );
    (sql, params)
}

fn placeholder(kind: ColumnKind, index: usize) -> String {
    // Date values travel as YYYY-MM-DD strings; cast at the SQL boundary.
    match kind {
        ColumnKind::Date => format!("${}::date", index),
        _ => format!("${}", index),
    }
}

// --- Normalization ---

/// Project the request body onto the column whitelist. Unknown keys are
/// ignored; known keys are coerced per column kind.
fn normalize(spec: &ResourceSpec, body: &Value) -> Result<Map<String, Value>, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::validation("request body must be a JSON object"))?;

    let mut out = Map::new();
    for column in spec.columns {
        let Some(raw) = object.get(column.name) else {
            continue;
        };
        out.insert(column.name.to_string(), normalize_value(column.name, column.kind, raw)?);
    }
    Ok(out)
}

fn normalize_value(name: &str, kind: ColumnKind, raw: &Value) -> Result<Value, ApiError> {
    match raw {
        Value::Null => Ok(Value::Null),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                // Empty-string optionals are stored as null.
                return Ok(Value::Null);
            }
            match kind {
                ColumnKind::Text => Ok(Value::String(trimmed.to_string())),
                ColumnKind::Integer => trimmed
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| ApiError::validation(format!("field '{}' must be an integer", name))),
                ColumnKind::Number => trimmed
                    .parse::<f64>()
                    .map(Value::from)
                    .map_err(|_| ApiError::validation(format!("field '{}' must be a number", name))),
                ColumnKind::Date => {
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
                        ApiError::validation(format!("field '{}' must be a YYYY-MM-DD date", name))
                    })?;
                    Ok(Value::String(trimmed.to_string()))
                }
            }
        }
        Value::Number(n) => match kind {
            ColumnKind::Integer => n
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| ApiError::validation(format!("field '{}' must be an integer", name))),
            ColumnKind::Number => Ok(Value::Number(n.clone())),
            _ => Err(ApiError::validation(format!(
                "field '{}' must be a string",
                name
            ))),
        },
        _ => Err(ApiError::validation(format!(
            "field '{}' has an unsupported value",
            name
        ))),
    }
}

fn require_required(spec: &ResourceSpec, fields: &Map<String, Value>) -> Result<(), ApiError> {
    for column in spec.columns.iter().filter(|c| c.required) {
        match fields.get(column.name) {
            Some(value) if !value.is_null() => {}
            _ => {
                return Err(ApiError::validation(format!(
                    "missing required field: {}",
                    column.name
                )))
            }
        }
    }
    Ok(())
}
