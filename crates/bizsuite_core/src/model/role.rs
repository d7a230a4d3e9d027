//! Role records and built-in role archetypes.

use crate::model::tenant::TenantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoleId = Uuid;

/// Built-in role names that receive module permissions automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleArchetype {
    Staff,
    Client,
    Vendor,
}

impl RoleArchetype {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Client => "client",
            Self::Vendor => "vendor",
        }
    }

    /// Matches a role name against the archetype names.
    ///
    /// Surrounding whitespace and ASCII case are ignored. Any other role name
    /// (custom roles such as `accountant`) has no archetype.
    pub fn from_role_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "staff" => Some(Self::Staff),
            "client" => Some(Self::Client),
            "vendor" => Some(Self::Vendor),
            _ => None,
        }
    }
}

/// Persisted role owned by one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub uuid: RoleId,
    pub tenant_uuid: TenantId,
    pub name: String,
}

impl RoleRecord {
    pub fn new(tenant_uuid: TenantId, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RoleArchetype;

    #[test]
    fn matches_archetypes_ignoring_case_and_padding() {
        assert_eq!(
            RoleArchetype::from_role_name(" Staff "),
            Some(RoleArchetype::Staff)
        );
        assert_eq!(
            RoleArchetype::from_role_name("client"),
            Some(RoleArchetype::Client)
        );
        assert_eq!(
            RoleArchetype::from_role_name("VENDOR"),
            Some(RoleArchetype::Vendor)
        );
    }

    #[test]
    fn custom_roles_have_no_archetype() {
        assert_eq!(RoleArchetype::from_role_name("accountant"), None);
        assert_eq!(RoleArchetype::from_role_name(""), None);
        assert_eq!(RoleArchetype::from_role_name("staff-lead"), None);
    }
}
