use serde::Serialize;

use crate::domain::role::RoleDetails;
use crate::dto::SelectOption;

/// Permissions offered on the role create and edit pages, grouped by guard.
#[derive(Debug, Serialize)]
pub struct RoleFormOptions {
    pub permissions: Vec<SelectOption>,
    pub guards: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RoleEditData {
    pub role: RoleDetails,
    pub options: RoleFormOptions,
    /// The super-admin role keeps its name.
    pub locked: bool,
}
