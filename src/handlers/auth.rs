//! Registration (email OTP), login, and password rotation.
//!
//! Registration is a three-step flow: `send-otp` stores a pending record and
//! dispatches the code, `resend-otp` rotates it, `verify-otp` consumes it
//! and creates the account. Account creation happens exactly once per
//! successful verification; the pending record is gone afterwards.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::FromRow;

use crate::auth::{self, password, Claims, Role};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    password: String,
    role: String,
}

/// POST /auth/send-otp - begin registration
pub async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = require_field(body.name, "name")?;
    let email = require_field(body.email, "email")?;
    let plain = require_field(body.password, "password")?;

    // Hash up front so the plaintext never sits in the pending map.
    let password_hash = password::hash(&plain)?;
    let code = state.otp.begin(&email, name, password_hash);

    state.mailer.send_code(&email, &code).await?;
    Ok(Json(json!({
        "success": true,
        "message": "verification code sent",
    })))
}

/// POST /auth/resend-otp - regenerate the code for a pending registration
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = require_field(body.email, "email")?;
    let code = state.otp.resend(&email)?;

    state.mailer.send_code(&email, &code).await?;
    Ok(Json(json!({
        "success": true,
        "message": "verification code resent",
    })))
}

/// POST /auth/verify-otp - complete registration and create the account
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = require_field(body.email, "email")?;
    let code = require_field(body.code, "code")?;

    let pending = state.otp.consume(&email, &code)?;

    // New accounts always start as plain users; the unique index on email
    // surfaces duplicate registrations as 409.
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, 'user') RETURNING id",
    )
    .bind(&pending.name)
    .bind(email.to_ascii_lowercase())
    .bind(&pending.password_hash)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("account created for user {}", id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "account created, you can now log in",
        })),
    ))
}

/// POST /auth/login - issue a session token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = require_field(body.email, "email")?;
    let plain = require_field(body.password, "password")?;

    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, password, role FROM users WHERE email = $1",
    )
    .bind(email.to_ascii_lowercase())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    if !password::verify(&plain, &user.password)? {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let role = match user.role.as_str() {
        "employee" => Role::Employee,
        _ => Role::User,
    };
    let claims = Claims::new(
        user.id,
        user.name.clone(),
        role,
        state.config.security.jwt_expiry_secs,
    );
    let token = auth::sign(&claims, &state.config.security.jwt_secret)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "role": role,
            "name": user.name,
            "expires_in": state.config.security.jwt_expiry_secs,
        }
    })))
}

/// PUT /auth/change-password - rotate the caller's password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = require_field(body.current_password, "current_password")?;
    let new = require_field(body.new_password, "new_password")?;

    let stored = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if !password::verify(&current, &stored)? {
        return Err(ApiError::unauthorized("current password is incorrect"));
    }

    let new_hash = password::hash(&new)?;
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(&new_hash)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true, "message": "password updated" })))
}

fn require_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::validation(format!("missing required field: {}", name))),
    }
}
