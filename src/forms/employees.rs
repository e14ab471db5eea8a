use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::domain::employee::EmployeeProfile;
use crate::domain::types::{Email, EmployeeCode, PersonName, PhoneNumber, optional_text};
use crate::forms::{FormError, check_password};

/// Employee screens edit the user account and the profile in one form.
#[derive(Debug, Deserialize, Validate)]
pub struct EmployeeForm {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
    #[validate(length(min = 1, max = 50, message = "The employee code field is required."))]
    pub employee_code: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub joining_date: Option<String>,
}

#[derive(Debug)]
pub struct EmployeePayload {
    pub name: PersonName,
    pub email: Email,
    pub password: Option<String>,
    pub profile: EmployeeProfile,
}

impl EmployeeForm {
    pub fn into_payload(self, password_required: bool) -> Result<EmployeePayload, FormError> {
        self.validate()?;

        let password = check_password(
            self.password.as_deref(),
            self.password_confirmation.as_deref(),
            password_required,
        )?;
        let phone = optional_text(self.phone)
            .map(PhoneNumber::new)
            .transpose()
            .map_err(|_| FormError::field("phone", "The phone format is invalid."))?;
        let joining_date = optional_text(self.joining_date)
            .map(|value| NaiveDate::parse_from_str(&value, "%Y-%m-%d"))
            .transpose()
            .map_err(|_| {
                FormError::field("joining_date", "The joining date is not a valid date.")
            })?;

        Ok(EmployeePayload {
            name: PersonName::new(self.name)
                .map_err(|_| FormError::field("name", "The name field is required."))?,
            email: Email::new(self.email)
                .map_err(|_| {
                    FormError::field("email", "The email must be a valid email address.")
                })?,
            password,
            profile: EmployeeProfile {
                employee_code: EmployeeCode::new(self.employee_code).map_err(|_| {
                    FormError::field("employee_code", "The employee code field is required.")
                })?,
                phone,
                designation: optional_text(self.designation),
                department: optional_text(self.department),
                address: optional_text(self.address),
                joining_date,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EmployeeForm {
        EmployeeForm {
            name: "John Smith".into(),
            email: "john@example.com".into(),
            password: Some("password1".into()),
            password_confirmation: Some("password1".into()),
            employee_code: "EMP-001".into(),
            phone: Some("+1 202 555 0143".into()),
            designation: Some("  ".into()),
            department: Some("Sales".into()),
            address: None,
            joining_date: Some("2024-02-29".into()),
        }
    }

    #[test]
    fn payload_normalises_profile() {
        let payload = form().into_payload(true).unwrap();
        assert_eq!(
            payload.profile.phone.as_ref().map(PhoneNumber::as_str),
            Some("+12025550143")
        );
        assert_eq!(payload.profile.designation, None);
        assert_eq!(
            payload.profile.joining_date,
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn bad_date_is_a_field_error() {
        let mut form = form();
        form.joining_date = Some("29/02/2024".into());
        let errors = form.into_payload(true).unwrap_err().into_field_errors();
        assert!(errors.contains_key("joining_date"));
    }
}
