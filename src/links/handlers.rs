//! HTTP surface of the relationship linker.
//!
//! For each association table: `POST /{table}` creates a link (employee
//! only), `GET /{table}/:b_id` lists enriched links for one B entity
//! (authenticated), `PUT`/`DELETE /{table}/:link_id` manage a single link
//! row (employee only).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::links::{repository, LinkSpec};
use crate::middleware::auth::{AuthUser, Employee};
use crate::state::AppState;

pub fn routes(spec: &'static LinkSpec) -> Router<AppState> {
    let collection = format!("/{}", spec.table);
    let item = format!("/{}/:id", spec.table);

    Router::new()
        .route(
            &collection,
            axum::routing::post(
                move |state: State<AppState>, employee: Employee, body: Json<Value>| {
                    create(state, spec, employee, body)
                },
            ),
        )
        .route(
            &item,
            get(move |state: State<AppState>, user: AuthUser, id: Path<i64>| {
                list_for_b(state, spec, user, id)
            })
            .put(
                move |state: State<AppState>, employee: Employee, id: Path<i64>, body: Json<Value>| {
                    update(state, spec, employee, id, body)
                },
            )
            .delete(move |state: State<AppState>, employee: Employee, id: Path<i64>| {
                unlink(state, spec, employee, id)
            }),
        )
}

async fn create(
    State(state): State<AppState>,
    spec: &'static LinkSpec,
    _employee: Employee,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let created = repository::link(&state.pool, spec, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": created })),
    ))
}

async fn list_for_b(
    State(state): State<AppState>,
    spec: &'static LinkSpec,
    _user: AuthUser,
    Path(b_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = repository::list_by_b(&state.pool, spec, b_id).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn update(
    State(state): State<AppState>,
    spec: &'static LinkSpec,
    _employee: Employee,
    Path(link_id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = repository::update(&state.pool, spec, link_id, &body).await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}

async fn unlink(
    State(state): State<AppState>,
    spec: &'static LinkSpec,
    _employee: Employee,
    Path(link_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    repository::unlink(&state.pool, spec, link_id).await?;
    Ok(Json(json!({ "success": true })))
}
