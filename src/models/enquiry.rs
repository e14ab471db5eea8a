//! Diesel models for contact enquiries.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::enquiry::{
    Enquiry as DomainEnquiry, NewEnquiry as DomainNewEnquiry,
    UpdateEnquiryRemark as DomainUpdateEnquiryRemark,
};
use crate::domain::types::{
    Email, EnquiryId, PersonName, PhoneNumber, SanitizedText, TypeConstraintError, UserId,
};
use crate::models::audit_stamp;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::enquiries)]
pub struct Enquiry {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub remark: Option<String>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::enquiries)]
pub struct NewEnquiry<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub message: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::enquiries)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateEnquiryRemark<'a> {
    pub remark: Option<&'a str>,
    pub updated_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Enquiry> for DomainEnquiry {
    type Error = TypeConstraintError;

    fn try_from(enquiry: Enquiry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EnquiryId::try_from(enquiry.id)?,
            name: PersonName::new(enquiry.name)?,
            email: Email::new(enquiry.email)?,
            phone: enquiry.phone.and_then(|phone| PhoneNumber::new(phone).ok()),
            subject: enquiry.subject,
            message: SanitizedText::new(enquiry.message)?,
            remark: enquiry.remark,
            audit: audit_stamp(
                enquiry.created_by,
                enquiry.updated_by,
                enquiry.created_at,
                enquiry.updated_at,
            ),
        })
    }
}

impl<'a> From<&'a DomainNewEnquiry> for NewEnquiry<'a> {
    fn from(enquiry: &'a DomainNewEnquiry) -> Self {
        Self {
            name: enquiry.name.as_str(),
            email: enquiry.email.as_str(),
            phone: enquiry.phone.as_ref().map(PhoneNumber::as_str),
            subject: enquiry.subject.as_deref(),
            message: enquiry.message.as_str(),
        }
    }
}

impl<'a> From<&'a DomainUpdateEnquiryRemark> for UpdateEnquiryRemark<'a> {
    fn from(update: &'a DomainUpdateEnquiryRemark) -> Self {
        Self {
            remark: update.remark.as_deref(),
            updated_by: update.updated_by.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}
