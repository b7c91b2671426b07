//! Panel roles.

use serde::{Deserialize, Serialize};

/// Role of a panel user.
///
/// ADM is a strict superset of MONITOR: any route a monitor may call, an
/// admin may call too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "MONITOR")]
    Monitor,
    #[serde(rename = "ADM")]
    Adm,
}

impl Role {
    /// Whether this role meets a route's minimum requirement.
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::Monitor => true,
            Role::Adm => self == Role::Adm,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Monitor => "MONITOR",
            Role::Adm => "ADM",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adm_satisfies_both_requirements() {
        assert!(Role::Adm.satisfies(Role::Monitor));
        assert!(Role::Adm.satisfies(Role::Adm));
    }

    #[test]
    fn monitor_cannot_satisfy_adm() {
        assert!(Role::Monitor.satisfies(Role::Monitor));
        assert!(!Role::Monitor.satisfies(Role::Adm));
    }

    #[test]
    fn serde_uses_uppercase_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Adm).unwrap(), "\"ADM\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"MONITOR\"").unwrap(),
            Role::Monitor
        );
    }
}
