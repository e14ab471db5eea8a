use serde::Deserialize;
use validator::Validate;

use crate::domain::enquiry::NewEnquiry;
use crate::domain::types::{Email, PersonName, PhoneNumber, SanitizedText, optional_text};
use crate::forms::FormError;

/// Public contact form posted to `/enquiries`.
#[derive(Debug, Deserialize, Validate)]
pub struct EnquiryForm {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "The subject may not be greater than 255 characters."))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "The message field is required."))]
    pub message: String,
}

impl TryFrom<EnquiryForm> for NewEnquiry {
    type Error = FormError;

    fn try_from(form: EnquiryForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: PersonName::new(form.name)
                .map_err(|_| FormError::field("name", "The name field is required."))?,
            email: Email::new(form.email)
                .map_err(|_| {
                    FormError::field("email", "The email must be a valid email address.")
                })?,
            phone: optional_text(form.phone)
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|_| FormError::field("phone", "The phone format is invalid."))?,
            subject: optional_text(form.subject),
            message: SanitizedText::new(form.message)
                .map_err(|_| FormError::field("message", "The message field is required."))?,
        })
    }
}

/// Admin note saved on `PUT /admin/enquiries/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct EnquiryRemarkForm {
    #[serde(default)]
    #[validate(length(max = 2000, message = "The remark may not be greater than 2000 characters."))]
    pub remark: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_from_message() {
        let enquiry = NewEnquiry::try_from(EnquiryForm {
            name: "Visitor".into(),
            email: "visitor@example.com".into(),
            phone: Some(String::new()),
            subject: None,
            message: "Hello <script>alert(1)</script><b>there</b>".into(),
        })
        .unwrap();
        assert_eq!(enquiry.message.as_str(), "Hello <b>there</b>");
        assert!(enquiry.phone.is_none());
    }

    #[test]
    fn script_only_message_is_rejected() {
        let err = NewEnquiry::try_from(EnquiryForm {
            name: "Visitor".into(),
            email: "visitor@example.com".into(),
            phone: None,
            subject: None,
            message: "<script>alert(1)</script>".into(),
        })
        .unwrap_err();
        assert!(err.into_field_errors().contains_key("message"));
    }
}
