//! HTTP surface of the generic CRUD engine.
//!
//! `routes(spec)` is the route factory: given a registry entry it yields the
//! collection and item routes for that resource, all backed by the same five
//! handlers. Reads honor the spec's access level; writes are employee-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::middleware::auth::{Employee, MaybeAuthUser};
use crate::resources::{repository, ReadAccess, ResourceSpec};
use crate::state::AppState;

/// Build `GET/POST /{name}` and `GET/PUT/DELETE /{name}/:id` for a resource.
pub fn routes(spec: &'static ResourceSpec) -> Router<AppState> {
    let collection = format!("/{}", spec.name);
    let item = format!("/{}/:id", spec.name);

    Router::new()
        .route(
            &collection,
            get(
                move |state: State<AppState>, auth: MaybeAuthUser, query: Query<HashMap<String, String>>| {
                    list(state, spec, auth, query)
                },
            )
            .post(move |state: State<AppState>, employee: Employee, body: Json<Value>| {
                create(state, spec, employee, body)
            }),
        )
        .route(
            &item,
            get(move |state: State<AppState>, auth: MaybeAuthUser, id: Path<i64>| {
                get_by_id(state, spec, auth, id)
            })
            .put(
                move |state: State<AppState>, employee: Employee, id: Path<i64>, body: Json<Value>| {
                    update(state, spec, employee, id, body)
                },
            )
            .delete(move |state: State<AppState>, employee: Employee, id: Path<i64>| {
                delete(state, spec, employee, id)
            }),
        )
}

fn check_read_access(spec: &ResourceSpec, auth: &MaybeAuthUser) -> Result<(), ApiError> {
    match spec.read_access {
        ReadAccess::Public => Ok(()),
        ReadAccess::Authenticated => {
            if auth.0.is_none() {
                return Err(ApiError::unauthorized("authentication required"));
            }
            Ok(())
        }
    }
}

async fn list(
    State(state): State<AppState>,
    spec: &'static ResourceSpec,
    auth: MaybeAuthUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    check_read_access(spec, &auth)?;

    let parent = match spec.parent_key.and_then(|key| query.get(key)) {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            ApiError::validation(format!(
                "query parameter '{}' must be an integer",
                spec.parent_key.unwrap_or("id")
            ))
        })?),
        None => None,
    };

    let rows = repository::list(&state.pool, spec, parent).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn get_by_id(
    State(state): State<AppState>,
    spec: &'static ResourceSpec,
    auth: MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    check_read_access(spec, &auth)?;
    let row = repository::get(&state.pool, spec, id).await?;
    Ok(Json(json!({ "success": true, "data": row })))
}

async fn create(
    State(state): State<AppState>,
    spec: &'static ResourceSpec,
    Employee(user): Employee,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let created = repository::create(&state.pool, spec, &body).await?;
    tracing::info!(
        "{} created {} {}",
        user.name,
        spec.label(),
        created[spec.primary_key]
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": created })),
    ))
}

async fn update(
    State(state): State<AppState>,
    spec: &'static ResourceSpec,
    _employee: Employee,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = repository::update(&state.pool, spec, id, &body).await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}

async fn delete(
    State(state): State<AppState>,
    spec: &'static ResourceSpec,
    _employee: Employee,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    repository::delete(&state.pool, spec, id).await?;
    Ok(Json(json!({ "success": true })))
}
