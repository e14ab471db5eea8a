use serde::{Deserialize, Serialize};

use crate::domain::AuditStamp;
use crate::domain::types::{Email, EnquiryId, PersonName, PhoneNumber, SanitizedText, UserId};

/// Contact-form submission with an admin remark.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub name: PersonName,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub subject: Option<String>,
    pub message: SanitizedText,
    pub remark: Option<String>,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

#[derive(Clone, Debug)]
pub struct NewEnquiry {
    pub name: PersonName,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub subject: Option<String>,
    pub message: SanitizedText,
}

#[derive(Clone, Debug)]
pub struct UpdateEnquiryRemark {
    pub remark: Option<String>,
    pub updated_by: Option<UserId>,
}
