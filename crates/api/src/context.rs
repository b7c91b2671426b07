use matricula_auth::{Monitor, Role};
use matricula_core::MonitorId;

/// Authenticated monitor context for a panel request.
///
/// Inserted by the auth middleware; must be present on all panel routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorContext {
    monitor_id: MonitorId,
    display_name: String,
    role: Role,
}

impl MonitorContext {
    pub fn new(monitor: &Monitor) -> Self {
        Self {
            monitor_id: monitor.id,
            display_name: monitor.name.clone(),
            role: monitor.role,
        }
    }

    pub fn monitor_id(&self) -> MonitorId {
        self.monitor_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
