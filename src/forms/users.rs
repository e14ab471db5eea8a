//! Forms for the user administration screens.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{Email, PermissionId, PersonName, RoleId, UserStatus};
use crate::domain::user::UserAssignments;
use crate::forms::{FormError, check_password};

/// Body of `POST /admin/users` and `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserForm {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub roles: Vec<i32>,
    #[serde(default)]
    pub permissions: Vec<i32>,
}

/// Validated user input. The password is still plain text here; the service
/// hashes it.
#[derive(Debug)]
pub struct UserPayload {
    pub name: PersonName,
    pub email: Email,
    pub password: Option<String>,
    pub status: UserStatus,
    pub assignments: UserAssignments,
}

pub(crate) fn to_ids<T, F>(
    values: &[i32],
    field: &'static str,
    make: F,
) -> Result<Vec<T>, FormError>
where
    T: Ord,
    F: Fn(i32) -> Result<T, crate::domain::types::TypeConstraintError>,
{
    let mut ids = values
        .iter()
        .map(|value| {
            make(*value)
                .map_err(|_| FormError::field(field, format!("The selected {field} is invalid.")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    ids.sort();
    ids.dedup();
    Ok(ids)
}

impl UserForm {
    /// Validates the form; `password_required` is set when creating.
    pub fn into_payload(self, password_required: bool) -> Result<UserPayload, FormError> {
        self.validate()?;

        let password = check_password(
            self.password.as_deref(),
            self.password_confirmation.as_deref(),
            password_required,
        )?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => UserStatus::Active,
            Some(value) => value
                .parse()
                .map_err(|_| FormError::field("status", "The selected status is invalid."))?,
        };

        Ok(UserPayload {
            name: PersonName::new(self.name)
                .map_err(|_| FormError::field("name", "The name field is required."))?,
            email: Email::new(self.email)
                .map_err(|_| {
                    FormError::field("email", "The email must be a valid email address.")
                })?,
            password,
            status,
            assignments: UserAssignments {
                role_ids: to_ids(&self.roles, "roles", RoleId::new)?,
                permission_ids: to_ids(&self.permissions, "permissions", PermissionId::new)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UserForm {
        UserForm {
            name: "Jane Doe".into(),
            email: "Jane@Example.com".into(),
            password: Some("secret123".into()),
            password_confirmation: Some("secret123".into()),
            status: None,
            roles: vec![2, 1, 2],
            permissions: vec![],
        }
    }

    #[test]
    fn payload_normalises_input() {
        let payload = form().into_payload(true).unwrap();
        assert_eq!(payload.email.as_str(), "jane@example.com");
        assert_eq!(payload.status, UserStatus::Active);
        assert_eq!(
            payload.assignments.role_ids,
            vec![RoleId::new(1).unwrap(), RoleId::new(2).unwrap()]
        );
    }

    #[test]
    fn password_optional_on_update() {
        let mut form = form();
        form.password = None;
        form.password_confirmation = None;
        assert!(form.into_payload(false).unwrap().password.is_none());
    }

    #[test]
    fn invalid_email_and_role_are_rejected() {
        let mut bad_email = form();
        bad_email.email = "not-an-email".into();
        let errors = bad_email.into_payload(true).unwrap_err().into_field_errors();
        assert!(errors.contains_key("email"));

        let mut bad_role = form();
        bad_role.roles = vec![0];
        let errors = bad_role.into_payload(true).unwrap_err().into_field_errors();
        assert!(errors.contains_key("roles"));
    }
}
