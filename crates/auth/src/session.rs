//! Panel session record and its validity window.
//!
//! The session is a small client-persisted record (e-mail, display name,
//! role, issue timestamp) gating access to panel screens. It is read and
//! written through the narrow [`SessionStore`] interface with the expiry
//! check made explicitly at the call site; there is no background timer.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// How long a panel session stays valid after issue, in minutes.
pub const SESSION_TIMEOUT_MINUTES: i64 = 30;

/// The session validity window as a `Duration`.
pub fn session_timeout() -> Duration {
    Duration::minutes(SESSION_TIMEOUT_MINUTES)
}

/// Client-persisted panel session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSession {
    pub email: String,
    #[serde(rename = "nome")]
    pub display_name: String,
    pub role: Role,
    /// Issue instant; the record expires `SESSION_TIMEOUT` after it.
    pub timestamp: DateTime<Utc>,
}

impl PanelSession {
    pub fn issue(
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            role,
            timestamp: now,
        }
    }

    /// Valid while `now - timestamp` is under the session window.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < session_timeout()
    }
}

/// Narrow store interface for the single session record.
///
/// Deliberately not a singleton: pass the store to whichever component needs
/// it, and check expiry where you read.
pub trait SessionStore: Send + Sync {
    fn read(&self) -> Option<PanelSession>;
    fn write(&self, session: PanelSession);
    fn clear(&self);
}

/// Read the session, enforcing expiry: an expired record is cleared and
/// treated as absent.
pub fn current_session(store: &dyn SessionStore, now: DateTime<Utc>) -> Option<PanelSession> {
    let session = store.read()?;
    if session.is_valid(now) {
        Some(session)
    } else {
        store.clear();
        None
    }
}

/// In-memory session store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Option<PanelSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn read(&self) -> Option<PanelSession> {
        self.inner.read().ok()?.clone()
    }

    fn write(&self, session: PanelSession) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(session);
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
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
    fn session_is_valid_inside_the_window() {
        let session = PanelSession::issue("joana@example.com", "Joana", Role::Monitor, t0());
        assert!(session.is_valid(t0() + Duration::minutes(29)));
        assert!(!session.is_valid(t0() + Duration::minutes(30)));
        assert!(!session.is_valid(t0() + Duration::hours(2)));
    }

    #[test]
    fn current_session_clears_expired_records() {
        let store = InMemorySessionStore::new();
        store.write(PanelSession::issue(
            "joana@example.com",
            "Joana",
            Role::Adm,
            t0(),
        ));

        assert!(current_session(&store, t0() + Duration::minutes(10)).is_some());

        // Past the window: treated as absent and removed from the store.
        assert!(current_session(&store, t0() + Duration::minutes(31)).is_none());
        assert!(store.read().is_none());
    }

    #[test]
    fn clear_logs_out() {
        let store = InMemorySessionStore::new();
        store.write(PanelSession::issue(
            "joana@example.com",
            "Joana",
            Role::Monitor,
            t0(),
        ));
        store.clear();
        assert!(store.read().is_none());
    }
}
