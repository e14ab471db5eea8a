use serde::{Deserialize, Serialize};

use crate::domain::AuditStamp;
use crate::domain::permission::Permission;
use crate::domain::types::{Guard, RoleId, RoleName, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub guard: Guard,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl Role {
    /// Whether this role carries the configured super-admin name.
    pub fn is_super_admin(&self, super_admin_role: &str) -> bool {
        self.name.as_str() == super_admin_role
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RoleDetails {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Clone, Debug)]
pub struct NewRole {
    pub name: RoleName,
    pub guard: Guard,
    pub created_by: Option<UserId>,
}

#[derive(Clone, Debug)]
pub struct UpdateRole {
    pub name: RoleName,
    pub guard: Guard,
    pub updated_by: Option<UserId>,
}
