use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::otp::OtpStore;
use crate::config::AppConfig;
use crate::mail::MailTransport;

/// Shared application state: the pool, configuration, the pending-OTP map,
/// and the mail collaborator. Everything else is per-request.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub otp: OtpStore,
    pub mailer: Arc<dyn MailTransport>,
}
