// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// API error with the status code and client-safe message it maps to.
///
/// Every handler failure becomes one of these; the JSON body is always
/// `{"error": <message>, "code": <CODE>}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),
    ExpiredCode(String),
    InvalidCode(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (unique key or referential constraint)
    Conflict(String),

    // 500 Internal Server Error
    Internal(String),

    // 502 Bad Gateway (mail transport failures)
    BadGateway(String),

    // 503 Service Unavailable (store unreachable)
    Unavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ExpiredCode(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCode(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::ExpiredCode(msg)
            | ApiError::InvalidCode(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Unavailable(msg) => msg,
        }
    }

    /// Stable code for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::ExpiredCode(_) => "EXPIRED_CODE",
            ApiError::InvalidCode(_) => "INVALID_CODE",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message(),
            "code": self.error_code(),
        })
    }
}

// Static constructor helpers
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError::Unavailable(message.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("record not found"),
            sqlx::Error::PoolTimedOut => {
                tracing::error!("database pool timed out");
                ApiError::unavailable("database temporarily unavailable")
            }
            sqlx::Error::Database(db) => {
                // 23505 = unique_violation, 23503 = foreign_key_violation
                match db.code().as_deref() {
                    Some("23505") => ApiError::conflict("duplicate value for a unique field"),
                    Some("23503") => {
                        ApiError::conflict("operation rejected by a referential constraint")
                    }
                    _ => {
                        tracing::error!("database error: {}", db.message());
                        ApiError::internal("an error occurred while processing your request")
                    }
                }
            }
            sqlx::Error::Io(e) => {
                tracing::error!("database connection error: {}", e);
                ApiError::unavailable("database temporarily unavailable")
            }
            other => {
                tracing::error!("sqlx error: {}", other);
                ApiError::internal("an error occurred while processing your request")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
