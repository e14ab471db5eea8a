use serde::Deserialize;
use validator::Validate;

use crate::domain::types::Email;
use crate::forms::FormError;

/// Credentials posted to `/login` and `/api/token`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

pub struct LoginPayload {
    pub email: Email,
    pub password: String,
}

impl TryFrom<LoginForm> for LoginPayload {
    type Error = FormError;

    fn try_from(form: LoginForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let email = Email::new(form.email)
            .map_err(|_| FormError::field("email", "The email must be a valid email address."))?;
        Ok(Self {
            email,
            password: form.password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalised() {
        let payload = LoginPayload::try_from(LoginForm {
            email: " Admin@Example.com ".into(),
            password: "password".into(),
        })
        .unwrap();
        assert_eq!(payload.email.as_str(), "admin@example.com");
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = LoginPayload::try_from(LoginForm {
            email: "admin@example.com".into(),
            password: String::new(),
        })
        .err()
        .unwrap();
        assert!(err.into_field_errors().contains_key("password"));
    }
}
