//! Pending-registration store for the email OTP flow.
//!
//! Process-wide map keyed by lower-cased email. Concurrent requests for the
//! same email are last-writer-wins; different emails never contend. A record
//! is consumed exactly once: a successful verification removes it, so a
//! repeat attempt sees `NotFound`.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct PendingSignup {
    pub code: String,
    pub name: String,
    /// Argon2 PHC string; the plaintext never enters the store.
    pub password_hash: String,
    pub expires_at: Instant,
}

#[derive(Clone)]
pub struct OtpStore {
    ttl: Duration,
    pending: Arc<Mutex<HashMap<String, PendingSignup>>>,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start (or restart) a registration. An existing pending record for the
    /// same email is silently replaced.
    pub fn begin(&self, email: &str, name: String, password_hash: String) -> String {
        let code = generate_code();
        let record = PendingSignup {
            code: code.clone(),
            name,
            password_hash,
            expires_at: Instant::now() + self.ttl,
        };
        let mut pending = self.pending.lock().expect("otp store lock poisoned");
        pending.insert(normalize_email(email), record);
        code
    }

    /// Regenerate the code and expiry in place. Requires an existing record.
    pub fn resend(&self, email: &str) -> Result<String, ApiError> {
        let mut pending = self.pending.lock().expect("otp store lock poisoned");
        let record = pending
            .get_mut(&normalize_email(email))
            .ok_or_else(|| ApiError::not_found("no pending registration for this email"))?;
        record.code = generate_code();
        record.expires_at = Instant::now() + self.ttl;
        Ok(record.code.clone())
    }

    /// Validate the code and remove the record on success.
    ///
    /// Expired records are dropped on the spot; a code mismatch keeps the
    /// record so the user can retry or resend.
    pub fn consume(&self, email: &str, code: &str) -> Result<PendingSignup, ApiError> {
        let key = normalize_email(email);
        let mut pending = self.pending.lock().expect("otp store lock poisoned");
        let record = pending
            .get(&key)
            .ok_or_else(|| ApiError::not_found("no pending registration for this email"))?;

        if Instant::now() > record.expires_at {
            pending.remove(&key);
            return Err(ApiError::ExpiredCode(
                "verification code has expired, request a new one".to_string(),
            ));
        }
        if record.code != code {
            return Err(ApiError::InvalidCode("incorrect verification code".to_string()));
        }
        Ok(pending.remove(&key).expect("record checked above"))
    }
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> OtpStore {
        OtpStore::new(Duration::from_secs(300))
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn consume_succeeds_exactly_once() {
        let store = store();
        let code = store.begin("a@example.com", "A".into(), "phc".into());

        let record = store.consume("a@example.com", &code).unwrap();
        assert_eq!(record.name, "A");

        // Record was removed: the second attempt is NotFound, not InvalidCode.
        let err = store.consume("a@example.com", &code).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn wrong_code_keeps_the_record() {
        let store = store();
        let code = store.begin("a@example.com", "A".into(), "phc".into());

        let err = store.consume("a@example.com", "000000x").unwrap_err();
        assert!(matches!(err, ApiError::InvalidCode(_)));

        assert!(store.consume("a@example.com", &code).is_ok());
    }

    #[test]
    fn expired_code_fails_even_when_correct() {
        let store = OtpStore::new(Duration::from_secs(0));
        let code = store.begin("a@example.com", "A".into(), "phc".into());
        std::thread::sleep(Duration::from_millis(5));

        let err = store.consume("a@example.com", &code).unwrap_err();
        assert!(matches!(err, ApiError::ExpiredCode(_)));

        // Expired record was dropped entirely.
        let err = store.consume("a@example.com", &code).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn resend_requires_a_pending_record_and_rotates_the_code() {
        let store = store();
        assert!(matches!(
            store.resend("missing@example.com").unwrap_err(),
            ApiError::NotFound(_)
        ));

        let first = store.begin("a@example.com", "A".into(), "phc".into());
        let second = store.resend("a@example.com").unwrap();

        if first != second {
            // Old code no longer verifies once rotated.
            assert!(matches!(
                store.consume("a@example.com", &first).unwrap_err(),
                ApiError::InvalidCode(_)
            ));
        }
        assert!(store.consume("a@example.com", &second).is_ok());
    }

    #[test]
    fn begin_replaces_an_existing_record() {
        let store = store();
        store.begin("a@example.com", "First".into(), "phc1".into());
        let code = store.begin("A@Example.com ", "Second".into(), "phc2".into());

        let record = store.consume("a@example.com", &code).unwrap();
        assert_eq!(record.name, "Second");
        assert_eq!(record.password_hash, "phc2");
    }
}
