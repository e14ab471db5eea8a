use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{
    ActionName, ControllerKey, Guard, PermissionGroupId, PermissionName, parse_actions,
};
use crate::forms::FormError;
use crate::forms::roles::parse_guard;

#[derive(Debug, Deserialize, Validate)]
pub struct PermissionForm {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    pub guard_name: Option<String>,
    #[serde(default)]
    pub permission_group_id: Option<i32>,
    #[serde(default)]
    pub controller: Option<String>,
    /// Comma or newline separated action names.
    #[serde(default)]
    pub methods: String,
}

/// Validated permission input. The controller may still be blank; the
/// service falls back to the group's controller.
#[derive(Debug)]
pub struct PermissionPayload {
    pub name: PermissionName,
    pub guard: Guard,
    pub group_id: Option<PermissionGroupId>,
    pub controller: Option<ControllerKey>,
    pub methods: Vec<ActionName>,
}

impl TryFrom<PermissionForm> for PermissionPayload {
    type Error = FormError;

    fn try_from(form: PermissionForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let controller = match form.controller.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(ControllerKey::new(value).map_err(|_| {
                FormError::field(
                    "controller",
                    "The controller may only contain letters, numbers, dashes and underscores.",
                )
            })?),
        };
        let methods = parse_actions(&form.methods.to_lowercase()).map_err(|_| {
            FormError::field(
                "methods",
                "The methods may only contain letters, numbers, dashes and underscores.",
            )
        })?;
        if methods.is_empty() {
            return Err(FormError::field("methods", "The methods field is required."));
        }
        let group_id = form
            .permission_group_id
            .map(PermissionGroupId::new)
            .transpose()
            .map_err(|_| {
                FormError::field(
                    "permission_group_id",
                    "The selected permission group is invalid.",
                )
            })?;

        Ok(Self {
            name: PermissionName::new(form.name)
                .map_err(|_| FormError::field("name", "The name field is required."))?,
            guard: parse_guard(form.guard_name.as_deref())?,
            group_id,
            controller,
            methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(methods: &str) -> PermissionForm {
        PermissionForm {
            name: "users-list".into(),
            guard_name: None,
            permission_group_id: Some(1),
            controller: Some(" ".into()),
            methods: methods.into(),
        }
    }

    #[test]
    fn methods_are_normalised() {
        let payload = PermissionPayload::try_from(form(" Show, index,show\n")).unwrap();
        let methods = payload
            .methods
            .iter()
            .map(ActionName::as_str)
            .collect::<Vec<_>>();
        assert_eq!(methods, vec!["index", "show"]);
        assert!(payload.controller.is_none());
    }

    #[test]
    fn empty_methods_are_rejected() {
        let err = PermissionPayload::try_from(form(" , ")).unwrap_err();
        assert!(err.into_field_errors().contains_key("methods"));
    }
}
