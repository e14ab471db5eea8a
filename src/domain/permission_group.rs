use serde::{Deserialize, Serialize};

use crate::domain::AuditStamp;
use crate::domain::types::{ControllerKey, PermissionGroupId, PermissionGroupName, UserId};

/// Permissions grouped by the controller they originate from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PermissionGroup {
    pub id: PermissionGroupId,
    pub name: PermissionGroupName,
    pub controller: Option<ControllerKey>,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

#[derive(Clone, Debug)]
pub struct NewPermissionGroup {
    pub name: PermissionGroupName,
    pub controller: Option<ControllerKey>,
    pub created_by: Option<UserId>,
}

#[derive(Clone, Debug)]
pub struct UpdatePermissionGroup {
    pub name: PermissionGroupName,
    pub controller: Option<ControllerKey>,
    pub updated_by: Option<UserId>,
}
