use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub mod otp;
pub mod password;

/// The two principal roles. `Employee` unlocks the management surface;
/// `User` is the public catalogue viewer with an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Employee => "employee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: users.id
    pub sub: i64,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, name: String, role: Role, expiry_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            name,
            role,
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Sign session claims with the configured HS256 secret.
pub fn sign(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| {
        tracing::error!("token signing failed: {}", e);
        ApiError::internal("failed to issue session token")
    })
}

/// Verify a bearer token. Bad signature, malformed payload, and expiry all
/// collapse to `Unauthorized` — the gate never distinguishes them for clients.
pub fn verify(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default())
        .map_err(|_| ApiError::unauthorized("invalid or expired session token"))?;
    Ok(data.claims)
}
