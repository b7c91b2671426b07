//! E-mail verification codes (OTP login).
//!
//! The panel logs in by e-mail: a 6-digit code is generated, stored keyed by
//! e-mail (one active code per address; a new request replaces the old one)
//! and sent out of band. Verification deletes the code on success (single
//! use) and purges it when the attempt reveals it expired.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Code lifetime in minutes.
pub const CODE_TTL: i64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("code not found or invalid")]
    InvalidCode,

    #[error("code expired")]
    Expired,
}

/// A pending verification code for one e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Issue a fresh 6-digit code valid for [`CODE_TTL`] minutes.
    pub fn issue(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            code: generate_code(),
            expires_at: now + Duration::minutes(CODE_TTL),
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Six decimal digits (100000–999999) from UUID entropy.
fn generate_code() -> String {
    let bytes = *Uuid::now_v7().as_bytes();
    // The trailing bytes of a v7 UUID are random.
    let seed = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    format!("{}", 100_000 + seed % 900_000)
}

/// Storage for pending codes, keyed by e-mail.
pub trait CodeStore: Send + Sync {
    /// Store a code, replacing any previous one for the same e-mail.
    fn upsert(&self, code: VerificationCode);
    fn find(&self, email: &str) -> Option<VerificationCode>;
    fn remove(&self, email: &str);
}

/// Check a submitted code: single use, expiry enforced.
pub fn verify_code(
    store: &dyn CodeStore,
    email: &str,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<(), VerificationError> {
    let pending = store.find(email).ok_or(VerificationError::InvalidCode)?;

    if pending.code != submitted {
        return Err(VerificationError::InvalidCode);
    }

    if pending.is_expired(now) {
        // Purge the dead code so the next attempt starts clean.
        store.remove(email);
        return Err(VerificationError::Expired);
    }

    // Valid: delete to prevent reuse.
    store.remove(email);
    Ok(())
}

/// In-memory code store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCodeStore {
    inner: RwLock<HashMap<String, VerificationCode>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeStore for InMemoryCodeStore {
    fn upsert(&self, code: VerificationCode) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(code.email.to_lowercase(), code);
        }
    }

    fn find(&self, email: &str) -> Option<VerificationCode> {
        let map = self.inner.read().ok()?;
        map.get(&email.to_lowercase()).cloned()
    }

    fn remove(&self, email: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(&email.to_lowercase());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn issued_codes_are_six_digits() {
        for _ in 0..50 {
            let code = VerificationCode::issue("a@example.com", t0());
            assert_eq!(code.code.len(), 6);
            assert!(code.code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn valid_code_verifies_once() {
        let store = InMemoryCodeStore::new();
        let issued = VerificationCode::issue("joana@example.com", t0());
        let code = issued.code.clone();
        store.upsert(issued);

        assert!(verify_code(&store, "joana@example.com", &code, t0()).is_ok());

        // Single use: the same code no longer verifies.
        assert_eq!(
            verify_code(&store, "joana@example.com", &code, t0()),
            Err(VerificationError::InvalidCode)
        );
    }

    #[test]
    fn wrong_code_is_rejected_and_kept() {
        let store = InMemoryCodeStore::new();
        let issued = VerificationCode::issue("joana@example.com", t0());
        let code = issued.code.clone();
        store.upsert(issued);

        assert_eq!(
            verify_code(&store, "joana@example.com", "000000", t0()),
            Err(VerificationError::InvalidCode)
        );

        // The right code still works afterwards.
        assert!(verify_code(&store, "joana@example.com", &code, t0()).is_ok());
    }

    #[test]
    fn expired_code_is_rejected_and_purged() {
        let store = InMemoryCodeStore::new();
        let issued = VerificationCode::issue("joana@example.com", t0());
        let code = issued.code.clone();
        store.upsert(issued);

        let later = t0() + Duration::minutes(CODE_TTL + 1);
        assert_eq!(
            verify_code(&store, "joana@example.com", &code, later),
            Err(VerificationError::Expired)
        );
        assert!(store.find("joana@example.com").is_none());
    }

    #[test]
    fn reissuing_replaces_the_previous_code() {
        let store = InMemoryCodeStore::new();
        let first = VerificationCode::issue("joana@example.com", t0());
        let first_code = first.code.clone();
        store.upsert(first);

        let second = VerificationCode::issue("joana@example.com", t0());
        let second_code = second.code.clone();
        store.upsert(second);

        if first_code != second_code {
            assert_eq!(
                verify_code(&store, "joana@example.com", &first_code, t0()),
                Err(VerificationError::InvalidCode)
            );
        }
        assert!(verify_code(&store, "joana@example.com", &second_code, t0()).is_ok());
    }
}
