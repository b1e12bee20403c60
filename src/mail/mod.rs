//! Outbound mail collaborator for the OTP flow.
//!
//! Delivery is delegated to an external service; this module only knows how
//! to hand a verification code over. Failures surface as 502 and the pending
//! registration stays in place, so a resend can recover.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;
use crate::error::ApiError;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_code(&self, email: &str, code: &str) -> Result<(), ApiError>;
}

/// Build the transport selected by configuration.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn MailTransport>, ApiError> {
    match config {
        MailConfig::Webhook {
            url,
            api_key,
            timeout_secs,
        } => Ok(Arc::new(WebhookMailer::new(
            url.clone(),
            api_key.clone(),
            Duration::from_secs(*timeout_secs),
        )?)),
        MailConfig::Log => Ok(Arc::new(LogMailer)),
    }
}

/// Posts the code to an HTTP mail-delivery webhook.
pub struct WebhookMailer {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(url: String, api_key: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("failed to build mail client: {}", e);
                ApiError::internal("failed to initialize mail transport")
            })?;
        Ok(Self {
            url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl MailTransport for WebhookMailer {
    async fn send_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        let body = json!({
            "to": email,
            "subject": "Your verification code",
            "text": format!("Your verification code is {}. It expires in 5 minutes.", code),
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("mail transport unreachable: {}", e);
                ApiError::bad_gateway("failed to dispatch verification email")
            })?;

        if !response.status().is_success() {
            tracing::error!("mail transport rejected request: {}", response.status());
            return Err(ApiError::bad_gateway("failed to dispatch verification email"));
        }

        tracing::info!("verification code dispatched to {}", email);
        Ok(())
    }
}

/// Development transport: the code only goes to the process log.
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        tracing::info!("[dev mail] verification code for {}: {}", email, code);
        Ok(())
    }
}
