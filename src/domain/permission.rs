use serde::{Deserialize, Serialize};

use crate::domain::AuditStamp;
use crate::domain::types::{
    ActionName, ControllerKey, Guard, PermissionGroupId, PermissionId, PermissionName, UserId,
};

/// A grant over a set of actions of a single controller.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub id: PermissionId,
    pub name: PermissionName,
    pub guard: Guard,
    pub group_id: Option<PermissionGroupId>,
    pub controller: ControllerKey,
    pub methods: Vec<ActionName>,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl Permission {
    /// True when this permission covers `action` on `controller`.
    pub fn allows(&self, controller: &ControllerKey, action: &ActionName) -> bool {
        &self.controller == controller && self.methods.iter().any(|m| m == action)
    }
}

#[derive(Clone, Debug)]
pub struct NewPermission {
    pub name: PermissionName,
    pub guard: Guard,
    pub group_id: Option<PermissionGroupId>,
    pub controller: ControllerKey,
    pub methods: Vec<ActionName>,
    pub created_by: Option<UserId>,
}

#[derive(Clone, Debug)]
pub struct UpdatePermission {
    pub name: PermissionName,
    pub guard: Guard,
    pub group_id: Option<PermissionGroupId>,
    pub controller: ControllerKey,
    pub methods: Vec<ActionName>,
    pub updated_by: Option<UserId>,
}
