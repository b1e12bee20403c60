//! The authorization gate.
//!
//! Two extractors compose the whole request-side auth story:
//! `AuthUser` authenticates (bearer token -> verified claims, failure is
//! 401) and `Employee` additionally authorizes the management role (valid
//! token with the wrong role is 403, never 401). Public handlers simply take
//! neither. The gate is stateless: nothing is stored beyond the token.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::auth::{self, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated identity resolved from the session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let claims = auth::verify(&token, &state.config.security.jwt_secret)?;
        Ok(AuthUser {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
        })
    }
}

/// Employee-only gate: authentication plus the role check.
#[derive(Debug, Clone)]
pub struct Employee(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for Employee {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Employee {
            return Err(ApiError::forbidden("employee role required"));
        }
        Ok(Employee(user))
    }
}

/// Optional authentication for routes that are public but may enrich
/// responses for signed-in users, and for registry-driven read gating.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get(header::AUTHORIZATION).is_none() {
            return Ok(MaybeAuthUser(None));
        }
        // A header that is present but invalid is still a hard 401.
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(user)))
    }
}

fn extract_bearer(parts: &Parts) -> Result<String, ApiError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

    let header_str = header_value
        .to_str()
        .map_err(|_| ApiError::unauthorized("invalid Authorization header"))?;

    let token = header_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer format"))?;

    if token.trim().is_empty() {
        return Err(ApiError::unauthorized("empty bearer token"));
    }
    Ok(token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_extraction_rules() {
        assert!(matches!(
            extract_bearer(&parts_with_auth(None)).unwrap_err(),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            extract_bearer(&parts_with_auth(Some("Basic abc"))).unwrap_err(),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            extract_bearer(&parts_with_auth(Some("Bearer  "))).unwrap_err(),
            ApiError::Unauthorized(_)
        ));
        assert_eq!(
            extract_bearer(&parts_with_auth(Some("Bearer tok123"))).unwrap(),
            "tok123"
        );
    }
}
