//! Monitor records and the directory used to resolve them.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use matricula_core::MonitorId;

use crate::roles::Role;

/// A panel user (monitor or admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Lookup of monitors by e-mail (the bearer identity).
///
/// Backed by whatever directory the deployment uses; the in-memory
/// implementation below serves tests and dev wiring.
pub trait MonitorDirectory: Send + Sync {
    /// Case-insensitive lookup by e-mail.
    fn find_by_email(&self, email: &str) -> Option<Monitor>;
}

/// In-memory monitor directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMonitorDirectory {
    by_email: RwLock<HashMap<String, Monitor>>,
}

impl InMemoryMonitorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, monitor: Monitor) {
        if let Ok(mut map) = self.by_email.write() {
            map.insert(monitor.email.to_lowercase(), monitor);
        }
    }
}

impl MonitorDirectory for InMemoryMonitorDirectory {
    fn find_by_email(&self, email: &str) -> Option<Monitor> {
        let map = self.by_email.read().ok()?;
        map.get(&email.to_lowercase()).cloned()
    }
}
