use serde::Serialize;

use crate::domain::permission::Permission;
use crate::domain::permission_group::PermissionGroup;

#[derive(Debug, Serialize)]
pub struct PermissionFormOptions {
    pub groups: Vec<PermissionGroup>,
    pub guards: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct PermissionEditData {
    pub permission: Permission,
    pub options: PermissionFormOptions,
}
