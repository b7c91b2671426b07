//! `matricula-auth` — monitor identity for the panel.
//!
//! Covers the three narrow concerns the panel needs: roles (monitor vs.
//! admin), the e-mail verification-code login (OTP), and the client-side
//! panel session record with its validity window. Everything is pure; stores
//! are traits the application layer implements.

pub mod authorize;
pub mod monitor;
pub mod otp;
pub mod roles;
pub mod session;

pub use authorize::{AuthError, authorize_bearer, extract_bearer_email};
pub use monitor::{InMemoryMonitorDirectory, Monitor, MonitorDirectory};
pub use otp::{
    CODE_TTL, CodeStore, InMemoryCodeStore, VerificationCode, VerificationError, verify_code,
};
pub use roles::Role;
pub use session::{
    InMemorySessionStore, PanelSession, SESSION_TIMEOUT_MINUTES, SessionStore, current_session,
    session_timeout,
};
