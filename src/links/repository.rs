//! SQL for association rows: insert, enriched listing, metadata update,
//! unlink. Same rules as the resource repository: SQL text comes from static
//! specs, values are always bound.

use serde_json::{json, Map, Value};
use sqlx::PgPool;

use crate::database;
use crate::error::ApiError;
use crate::links::LinkSpec;
use crate::resources::ColumnKind;

/// Create an association row. Both foreign keys are required; duplicates are
/// allowed (the same pair may carry different roles).
pub async fn link(pool: &PgPool, spec: &LinkSpec, body: &Value) -> Result<Value, ApiError> {
    let a_id = required_id(body, spec.a_fk)?;
    let b_id = required_id(body, spec.b_fk)?;
    let attrs = normalize_attrs(spec, body)?;

    let (sql, params) = build_insert(spec, a_id, b_id, &attrs);
    let id = database::execute_returning_id(pool, &sql, &params).await?;

    let mut out = attrs;
    out.insert("id".to_string(), Value::from(id));
    out.insert(spec.a_fk.to_string(), Value::from(a_id));
    out.insert(spec.b_fk.to_string(), Value::from(b_id));
    Ok(Value::Object(out))
}

/// List links for one B entity, enriched with A-side columns, ordered by the
/// A display column (then link id for stable output on ties).
pub async fn list_by_b(pool: &PgPool, spec: &LinkSpec, b_id: i64) -> Result<Vec<Value>, ApiError> {
    let sql = build_list_by_b(spec);
    database::fetch_json_rows(pool, &sql, &[Value::from(b_id)]).await
}

/// Update the metadata attributes of one link row.
pub async fn update(
    pool: &PgPool,
    spec: &LinkSpec,
    link_id: i64,
    body: &Value,
) -> Result<Value, ApiError> {
    let attrs = normalize_attrs(spec, body)?;
    if attrs.is_empty() {
        return Err(ApiError::validation("no fields to update"));
    }

    let (sql, params) = build_update(spec, &attrs, link_id);
    let affected = database::execute(pool, &sql, &params).await?;
    if affected == 0 {
        return Err(ApiError::not_found(format!(
            "{} link {} not found",
            spec.table, link_id
        )));
    }

    let mut out = attrs;
    out.insert("id".to_string(), Value::from(link_id));
    Ok(Value::Object(out))
}

pub async fn unlink(pool: &PgPool, spec: &LinkSpec, link_id: i64) -> Result<(), ApiError> {
    let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", spec.table);
    let affected = database::execute(pool, &sql, &[Value::from(link_id)]).await?;
    if affected == 0 {
        return Err(ApiError::not_found(format!(
            "{} link {} not found",
            spec.table, link_id
        )));
    }
    Ok(())
}

fn required_id(body: &Value, key: &str) -> Result<i64, ApiError> {
    match body.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ApiError::validation(format!("field '{}' must be an integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::validation(format!("field '{}' must be an integer", key))),
        _ => Err(ApiError::validation(format!("missing required field: {}", key))),
    }
}

fn normalize_attrs(spec: &LinkSpec, body: &Value) -> Result<Map<String, Value>, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::validation("request body must be a JSON object"))?;

    let mut out = Map::new();
    for column in spec.attrs {
        let Some(raw) = object.get(column.name) else {
            continue;
        };
        match raw {
            Value::Null => {
                out.insert(column.name.to_string(), Value::Null);
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    out.insert(column.name.to_string(), Value::Null);
                } else if column.kind == ColumnKind::Date {
                    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
                        ApiError::validation(format!(
                            "field '{}' must be a YYYY-MM-DD date",
                            column.name
                        ))
                    })?;
                    out.insert(column.name.to_string(), json!(trimmed));
                } else {
                    out.insert(column.name.to_string(), json!(trimmed));
                }
            }
            _ => {
                return Err(ApiError::validation(format!(
                    "field '{}' must be a string",
                    column.name
                )))
            }
        }
    }
    Ok(out)
}

fn build_insert(
    spec: &LinkSpec,
    a_id: i64,
    b_id: i64,
    attrs: &Map<String, Value>,
) -> (String, Vec<Value>) {
    let mut columns = vec![format!("\"{}\"", spec.a_fk), format!("\"{}\"", spec.b_fk)];
    let mut placeholders = vec!["$1".to_string(), "$2".to_string()];
    let mut params = vec![Value::from(a_id), Value::from(b_id)];

    for column in spec.attrs {
        if let Some(value) = attrs.get(column.name) {
            params.push(value.clone());
            columns.push(format!("\"{}\"", column.name));
            placeholders.push(match column.kind {
                ColumnKind::Date => format!("${}::date", params.len()),
                _ => format!("${}", params.len()),
            });
        }
    }

    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING \"id\"",
        spec.table,
        columns.join(", "),
        placeholders.join(", ")
    );
    (sql, params)
}

fn build_list_by_b(spec: &LinkSpec) -> String {
    let enrich: Vec<String> = spec
        .a_select
        .iter()
        .map(|(column, alias)| format!("a.\"{}\" AS \"{}\"", column, alias))
        .collect();

    format!(
        "SELECT row_to_json(t) AS row FROM (\
         SELECT l.*, {} FROM \"{}\" l \
         JOIN \"{}\" a ON a.\"id\" = l.\"{}\" \
         WHERE l.\"{}\" = $1 ORDER BY a.\"{}\", l.\"id\") t",
        enrich.join(", "),
        spec.table,
        spec.a_table,
        spec.a_fk,
        spec.b_fk,
        spec.a_display
    )
}

fn build_update(spec: &LinkSpec, attrs: &Map<String, Value>, link_id: i64) -> (String, Vec<Value>) {
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for column in spec.attrs {
        if let Some(value) = attrs.get(column.name) {
            params.push(value.clone());
            assignments.push(match column.kind {
                ColumnKind::Date => format!("\"{}\" = ${}::date", column.name, params.len()),
                _ => format!("\"{}\" = ${}", column.name, params.len()),
            });
        }
    }

    params.push(Value::from(link_id));
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"id\" = ${}",
        spec.table,
        assignments.join(", "),
        params.len()
    );
    (sql, params)
}
