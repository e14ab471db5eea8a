//! Form definitions backing the admin routes.
//!
//! Every form deserializes from either a JSON body or an urlencoded body with
//! repeated keys, validates with `validator` and converts into a typed payload.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use validator::ValidationErrors;

pub mod auth;
pub mod employees;
pub mod enquiries;
pub mod permission_groups;
pub mod permissions;
pub mod roles;
pub mod users;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

impl FormError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        FormError::Field {
            field,
            message: message.into(),
        }
    }

    /// Flattens the error into field name to messages.
    pub fn into_field_errors(self) -> BTreeMap<String, Vec<String>> {
        let mut errors = BTreeMap::new();
        match self {
            FormError::Validation(validation) => {
                for (field, field_errors) in validation.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|error| match &error.message {
                            Some(message) => message.to_string(),
                            None => format!("The {field} field is invalid."),
                        })
                        .collect::<Vec<_>>();
                    errors.insert(field.to_string(), messages);
                }
            }
            FormError::Field { field, message } => {
                errors.insert(field.to_string(), vec![message]);
            }
        }
        errors
    }
}

/// Query string accepted by every index action.
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl IndexParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Checks the password rules shared by user and employee forms.
pub(crate) fn check_password(
    password: Option<&str>,
    confirmation: Option<&str>,
    required: bool,
) -> Result<Option<String>, FormError> {
    let password = password.unwrap_or_default();
    if password.is_empty() {
        if required {
            return Err(FormError::field("password", "The password field is required."));
        }
        return Ok(None);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FormError::field(
            "password",
            format!("The password must be at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    }
    if confirmation != Some(password) {
        return Err(FormError::field(
            "password",
            "The password confirmation does not match.",
        ));
    }
    Ok(Some(password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(check_password(None, None, true).is_err());
        assert_eq!(check_password(Some(""), None, false).unwrap(), None);
        assert!(check_password(Some("short"), Some("short"), false).is_err());
        assert!(check_password(Some("long enough"), Some("different"), true).is_err());
        assert_eq!(
            check_password(Some("long enough"), Some("long enough"), true).unwrap(),
            Some("long enough".to_string())
        );
    }

    #[test]
    fn field_errors_are_keyed_by_field() {
        let errors = FormError::field("email", "The email is invalid.").into_field_errors();
        assert_eq!(errors["email"], vec!["The email is invalid.".to_string()]);
    }
}
