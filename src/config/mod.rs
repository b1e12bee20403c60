use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Startup configuration errors. Any of these abort the process: secrets and
/// connection parameters must come from the environment, never from literal
/// defaults in shipped code.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("environment variable {0} is empty")]
    Empty(&'static str),

    #[error("environment variable {0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub otp_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// Session lifetime. Fixed at one hour unless overridden.
    pub jwt_expiry_secs: i64,
}

/// Mail transport selection. `Webhook` posts the OTP code to an external
/// delivery service; `Log` writes it to the process log and is only for
/// development, selected explicitly via MAIL_TRANSPORT=log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MailConfig {
    Webhook {
        url: String,
        api_key: String,
        timeout_secs: u64,
    },
    Log,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parsed_or("DB_ACQUIRE_TIMEOUT_SECS", 10)?,
        };

        let security = SecurityConfig {
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_secs: parsed_or("JWT_EXPIRY_SECS", 3600)?,
        };

        let mail = match env::var("MAIL_TRANSPORT").as_deref() {
            Ok("log") => MailConfig::Log,
            Ok("webhook") | Err(_) => MailConfig::Webhook {
                url: required("MAIL_WEBHOOK_URL")?,
                api_key: required("MAIL_API_KEY")?,
                timeout_secs: parsed_or("MAIL_TIMEOUT_SECS", 15)?,
            },
            Ok(other) => {
                return Err(ConfigError::Invalid("MAIL_TRANSPORT", other.to_string()));
            }
        };

        Ok(Self {
            port: parsed_or("PORT", 3000)?,
            database,
            security,
            mail,
            otp_ttl_secs: parsed_or("OTP_TTL_SECS", 300)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(value)
}

fn parsed_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var mutation is process-wide, so everything lives in one test.
    #[test]
    fn requires_secrets_and_applies_defaults() {
        for key in [
            "DATABASE_URL",
            "JWT_SECRET",
            "MAIL_TRANSPORT",
            "MAIL_WEBHOOK_URL",
            "MAIL_API_KEY",
            "PORT",
            "JWT_EXPIRY_SECS",
        ] {
            env::remove_var(key);
        }

        // No DATABASE_URL at all
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        env::set_var("DATABASE_URL", "postgres://app@localhost/catalog");

        // JWT secret must be present and non-empty
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
        env::set_var("JWT_SECRET", "   ");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Empty("JWT_SECRET"))
        ));
        env::set_var("JWT_SECRET", "test-secret");

        // Webhook transport is the default and needs its settings
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Missing("MAIL_WEBHOOK_URL"))
        ));

        env::set_var("MAIL_TRANSPORT", "log");
        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.port, 3000);
        assert_eq!(config.security.jwt_expiry_secs, 3600);
        assert_eq!(config.otp_ttl_secs, 300);
        assert!(matches!(config.mail, MailConfig::Log));

        env::set_var("MAIL_TRANSPORT", "carrier-pigeon");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Invalid("MAIL_TRANSPORT", _))
        ));
        env::remove_var("MAIL_TRANSPORT");
        env::remove_var("DATABASE_URL");
        env::remove_var("JWT_SECRET");
    }
}
