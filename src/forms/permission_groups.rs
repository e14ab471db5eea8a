use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{ControllerKey, PermissionGroupName};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
pub struct PermissionGroupForm {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    pub controller: Option<String>,
}

#[derive(Debug)]
pub struct PermissionGroupPayload {
    pub name: PermissionGroupName,
    pub controller: Option<ControllerKey>,
}

impl TryFrom<PermissionGroupForm> for PermissionGroupPayload {
    type Error = FormError;

    fn try_from(form: PermissionGroupForm) -> Result<Self, Self::Error> {
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
        Ok(Self {
            name: PermissionGroupName::new(form.name)
                .map_err(|_| FormError::field("name", "The name field is required."))?,
            controller,
        })
    }
}
