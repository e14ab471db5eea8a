//! Diesel models for employee profiles.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::employee::{Employee as DomainEmployee, EmployeeProfile};
use crate::domain::types::{EmployeeCode, EmployeeId, PhoneNumber, TypeConstraintError, UserId};
use crate::models::audit_stamp;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::employees)]
pub struct Employee {
    pub id: i32,
    pub user_id: i32,
    pub employee_code: String,
    pub phone: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub address: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::employees)]
pub struct NewEmployee<'a> {
    pub user_id: i32,
    pub employee_code: &'a str,
    pub phone: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub department: Option<&'a str>,
    pub address: Option<&'a str>,
    pub joining_date: Option<NaiveDate>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::employees)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateEmployee<'a> {
    pub employee_code: &'a str,
    pub phone: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub department: Option<&'a str>,
    pub address: Option<&'a str>,
    pub joining_date: Option<NaiveDate>,
    pub updated_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl<'a> NewEmployee<'a> {
    pub fn new(user_id: i32, profile: &'a EmployeeProfile, actor: Option<UserId>) -> Self {
        let actor = actor.map(UserId::get);
        Self {
            user_id,
            employee_code: profile.employee_code.as_str(),
            phone: profile.phone.as_ref().map(PhoneNumber::as_str),
            designation: profile.designation.as_deref(),
            department: profile.department.as_deref(),
            address: profile.address.as_deref(),
            joining_date: profile.joining_date,
            created_by: actor,
            updated_by: actor,
        }
    }
}

impl<'a> UpdateEmployee<'a> {
    pub fn new(profile: &'a EmployeeProfile, actor: Option<UserId>) -> Self {
        Self {
            employee_code: profile.employee_code.as_str(),
            phone: profile.phone.as_ref().map(PhoneNumber::as_str),
            designation: profile.designation.as_deref(),
            department: profile.department.as_deref(),
            address: profile.address.as_deref(),
            joining_date: profile.joining_date,
            updated_by: actor.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl TryFrom<Employee> for DomainEmployee {
    type Error = TypeConstraintError;

    fn try_from(employee: Employee) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EmployeeId::try_from(employee.id)?,
            user_id: UserId::try_from(employee.user_id)?,
            employee_code: EmployeeCode::new(employee.employee_code)?,
            // Phones saved before normalization are dropped rather than failing the row.
            phone: employee.phone.and_then(|phone| PhoneNumber::new(phone).ok()),
            designation: employee.designation,
            department: employee.department,
            address: employee.address,
            joining_date: employee.joining_date,
            audit: audit_stamp(
                employee.created_by,
                employee.updated_by,
                employee.created_at,
                employee.updated_at,
            ),
        })
    }
}
