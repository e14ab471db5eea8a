use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::AuditStamp;
use crate::domain::types::{EmployeeCode, EmployeeId, PhoneNumber, UserId};
use crate::domain::user::{NewUser, UpdateUser, User};

/// Employment profile attached 1:1 to a user account.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: EmployeeId,
    pub user_id: UserId,
    pub employee_code: EmployeeCode,
    pub phone: Option<PhoneNumber>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub address: Option<String>,
    pub joining_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EmployeeWithUser {
    #[serde(flatten)]
    pub employee: Employee,
    pub user: User,
}

#[derive(Clone, Debug)]
pub struct EmployeeProfile {
    pub employee_code: EmployeeCode,
    pub phone: Option<PhoneNumber>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub address: Option<String>,
    pub joining_date: Option<NaiveDate>,
}

#[derive(Clone, Debug)]
pub struct NewEmployee {
    pub user: NewUser,
    pub profile: EmployeeProfile,
    pub created_by: Option<UserId>,
}

#[derive(Clone, Debug)]
pub struct UpdateEmployee {
    pub user: UpdateUser,
    pub profile: EmployeeProfile,
    pub updated_by: Option<UserId>,
}
