use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{Guard, PermissionId, RoleName};
use crate::forms::FormError;
use crate::forms::users::to_ids;

#[derive(Debug, Deserialize, Validate)]
pub struct RoleForm {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    pub guard_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<i32>,
}

#[derive(Debug)]
pub struct RolePayload {
    pub name: RoleName,
    pub guard: Guard,
    pub permission_ids: Vec<PermissionId>,
}

/// Parses an optional guard field, defaulting to `web`.
pub(crate) fn parse_guard(value: Option<&str>) -> Result<Guard, FormError> {
    match value.map(str::trim) {
        None | Some("") => Ok(Guard::Web),
        Some(value) => value
            .parse()
            .map_err(|_| FormError::field("guard_name", "The selected guard name is invalid.")),
    }
}

impl TryFrom<RoleForm> for RolePayload {
    type Error = FormError;

    fn try_from(form: RoleForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: RoleName::new(form.name)
                .map_err(|_| FormError::field("name", "The name field is required."))?,
            guard: parse_guard(form.guard_name.as_deref())?,
            permission_ids: to_ids(&form.permissions, "permissions", PermissionId::new)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_defaults_to_web() {
        let payload = RolePayload::try_from(RoleForm {
            name: "Editor".into(),
            guard_name: Some(String::new()),
            permissions: vec![3],
        })
        .unwrap();
        assert_eq!(payload.guard, Guard::Web);
        assert_eq!(payload.permission_ids, vec![PermissionId::new(3).unwrap()]);
    }

    #[test]
    fn unknown_guard_is_rejected() {
        let err = RolePayload::try_from(RoleForm {
            name: "Editor".into(),
            guard_name: Some("admin".into()),
            permissions: vec![],
        })
        .unwrap_err();
        assert!(err.into_field_errors().contains_key("guard_name"));
    }
}
