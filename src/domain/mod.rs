//! Domain aggregates exposed by the admin service layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::UserId;

pub mod access;
pub mod employee;
pub mod enquiry;
pub mod permission;
pub mod permission_group;
pub mod role;
pub mod types;
pub mod user;

/// Audit columns shared by every record: who touched it and when.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct AuditStamp {
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
