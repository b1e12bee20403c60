//! Router-level tests for the authorization gate and pre-store validation.
//!
//! These run against the real router with a lazily-connected pool pointing
//! at nothing: requests that are rejected by the gate or by validation never
//! touch the store, so their behavior is fully deterministic offline. For
//! requests that pass the gate we only assert that the gate let them
//! through (anything but 401/403).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tech_catalog_api::auth::otp::OtpStore;
use tech_catalog_api::auth::{self, Claims, Role};
use tech_catalog_api::config::{AppConfig, DatabaseConfig, MailConfig, SecurityConfig};
use tech_catalog_api::mail::LogMailer;
use tech_catalog_api::routes;
use tech_catalog_api::state::AppState;

const SECRET: &str = "router-test-secret";

fn test_app() -> axum::Router {
    let config = AppConfig {
        port: 0,
        database: DatabaseConfig {
            // Unreachable on purpose; the pool connects lazily.
            url: "postgres://nobody@127.0.0.1:1/nothing".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        security: SecurityConfig {
            jwt_secret: SECRET.to_string(),
            jwt_expiry_secs: 3600,
        },
        mail: MailConfig::Log,
        otp_ttl_secs: 300,
    };

    let pool = tech_catalog_api::database::connect(&config.database).expect("lazy pool");
    routes::app(AppState {
        pool,
        config: Arc::new(config),
        otp: OtpStore::new(Duration::from_secs(300)),
        mailer: Arc::new(LogMailer),
    })
}

fn token(role: Role) -> String {
    let claims = Claims::new(1, "Test".to_string(), role, 3600);
    auth::sign(&claims, SECRET).unwrap()
}

fn expired_token(role: Role) -> String {
    let mut claims = Claims::new(1, "Test".to_string(), role, 3600);
    claims.exp = claims.iat - 7200;
    auth::sign(&claims, SECRET).unwrap()
}

fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn write_routes_require_a_token() -> Result<()> {
    let response = test_app()
        .oneshot(request("POST", "/technologies", None, Some(r#"{"name":"X"}"#)))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn garbage_and_expired_tokens_are_401() -> Result<()> {
    let response = test_app()
        .oneshot(request(
            "POST",
            "/technologies",
            Some("not-a-jwt"),
            Some(r#"{"name":"X"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = expired_token(Role::Employee);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/technologies",
            Some(&expired),
            Some(r#"{"name":"X"}"#),
        ))
        .await?;
    // Expired always 401, regardless of payload validity.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn user_role_on_employee_route_is_403_never_401() -> Result<()> {
    let user = token(Role::User);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/technologies",
            Some(&user),
            Some(r#"{"name":"X"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await?;
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn employee_token_clears_the_gate() -> Result<()> {
    let employee = token(Role::Employee);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/technologies",
            Some(&employee),
            Some(r#"{"name":"X"}"#),
        ))
        .await?;
    // The store is unreachable in this test; all that matters is that the
    // gate did not reject the request.
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn empty_update_is_rejected_before_the_store() -> Result<()> {
    let employee = token(Role::Employee);
    let response = test_app()
        .oneshot(request("PUT", "/technologies/5", Some(&employee), Some("{}")))
        .await?;
    // 400 even though the store is down: the empty field set never reaches it.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn create_without_required_fields_is_rejected_before_the_store() -> Result<()> {
    let employee = token(Role::Employee);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/publications",
            Some(&employee),
            Some(r#"{"title":"Paper"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await?;
    assert!(body["error"].as_str().unwrap().contains("tech_id"));
    Ok(())
}

#[tokio::test]
async fn link_creation_requires_both_ids() -> Result<()> {
    let employee = token(Role::Employee);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/employee_patents",
            Some(&employee),
            Some(r#"{"employee_id":7,"role":"Lead"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await?;
    assert!(body["error"].as_str().unwrap().contains("patent_id"));
    Ok(())
}

#[tokio::test]
async fn child_table_reads_require_authentication() -> Result<()> {
    let response = test_app()
        .oneshot(request("GET", "/versions", None, None))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Any authenticated role clears the read gate on child tables.
    let user = token(Role::User);
    let response = test_app()
        .oneshot(request("GET", "/versions", Some(&user), None))
        .await?;
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn malformed_report_filter_is_rejected_before_the_store() -> Result<()> {
    let response = test_app()
        .oneshot(request("GET", "/reports?category=technologies&trl_min=high", None, None))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn change_password_requires_authentication() -> Result<()> {
    let response = test_app()
        .oneshot(request(
            "PUT",
            "/auth/change-password",
            None,
            Some(r#"{"current_password":"a","new_password":"b"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn send_otp_validates_fields_and_uses_the_dev_mailer() -> Result<()> {
    let response = test_app()
        .oneshot(request(
            "POST",
            "/auth/send-otp",
            None,
            Some(r#"{"email":"a@example.com"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Complete input: pending record is stored and the log mailer accepts
    // the code without any external service.
    let response = test_app()
        .oneshot(request(
            "POST",
            "/auth/send-otp",
            None,
            Some(r#"{"name":"A","email":"a@example.com","password":"pw123456"}"#),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn degraded_health_does_not_leak_store_details() -> Result<()> {
    let response = test_app()
        .oneshot(request("GET", "/health", None, None))
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await?;
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["database"], "unreachable");
    // Nothing from the driver error (host, port, user) reaches the body.
    let rendered = body.to_string();
    assert!(!rendered.contains("127.0.0.1"));
    assert!(!rendered.contains("nobody"));
    Ok(())
}

#[tokio::test]
async fn root_endpoint_is_public() -> Result<()> {
    let response = test_app()
        .oneshot(request("GET", "/", None, None))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["success"], true);
    Ok(())
}
