//! Request authorization for panel routes.
//!
//! The panel authenticates with `Authorization: Bearer <email>`; the e-mail
//! is resolved against the monitor directory and checked against the route's
//! minimum role. Pure policy: no IO beyond the injected directory lookup.

use thiserror::Error;

use crate::monitor::{Monitor, MonitorDirectory};
use crate::roles::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization token missing")]
    MissingToken,

    #[error("invalid e-mail in authorization token")]
    InvalidEmail,

    #[error("monitor not found or not authorized")]
    UnknownMonitor,

    #[error("this operation requires administrator privileges")]
    Forbidden,
}

/// Extract the bearer e-mail from an `Authorization` header value.
pub fn extract_bearer_email(header: &str) -> Result<&str, AuthError> {
    let email = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?
        .trim();

    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidEmail);
    }

    Ok(email)
}

/// Resolve a bearer header against the directory and enforce a minimum role.
pub fn authorize_bearer(
    directory: &dyn MonitorDirectory,
    header: Option<&str>,
    required: Role,
) -> Result<Monitor, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let email = extract_bearer_email(header)?;

    let monitor = directory
        .find_by_email(email)
        .ok_or(AuthError::UnknownMonitor)?;

    if !monitor.role.satisfies(required) {
        return Err(AuthError::Forbidden);
    }

    Ok(monitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::InMemoryMonitorDirectory;
    use matricula_core::MonitorId;

    fn directory_with(email: &str, role: Role) -> InMemoryMonitorDirectory {
        let directory = InMemoryMonitorDirectory::new();
        directory.insert(Monitor {
            id: MonitorId::new(),
            name: "Joana".to_string(),
            email: email.to_string(),
            role,
        });
        directory
    }

    #[test]
    fn extracts_bearer_email() {
        assert_eq!(
            extract_bearer_email("Bearer joana@example.com").unwrap(),
            "joana@example.com"
        );
        assert_eq!(
            extract_bearer_email("Basic abc"),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            extract_bearer_email("Bearer not-an-email"),
            Err(AuthError::InvalidEmail)
        );
        assert_eq!(extract_bearer_email("Bearer  "), Err(AuthError::InvalidEmail));
    }

    #[test]
    fn resolves_and_authorizes_known_monitor() {
        let directory = directory_with("joana@example.com", Role::Monitor);
        let monitor = authorize_bearer(
            &directory,
            Some("Bearer joana@example.com"),
            Role::Monitor,
        )
        .unwrap();
        assert_eq!(monitor.name, "Joana");
    }

    #[test]
    fn rejects_unknown_monitor() {
        let directory = directory_with("joana@example.com", Role::Monitor);
        let err = authorize_bearer(
            &directory,
            Some("Bearer other@example.com"),
            Role::Monitor,
        )
        .unwrap_err();
        assert_eq!(err, AuthError::UnknownMonitor);
    }

    #[test]
    fn monitor_is_rejected_from_adm_routes() {
        let directory = directory_with("joana@example.com", Role::Monitor);
        let err = authorize_bearer(
            &directory,
            Some("Bearer joana@example.com"),
            Role::Adm,
        )
        .unwrap_err();
        assert_eq!(err, AuthError::Forbidden);
    }

    #[test]
    fn missing_header_is_rejected() {
        let directory = directory_with("joana@example.com", Role::Monitor);
        let err = authorize_bearer(&directory, None, Role::Monitor).unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
    }
}
