//! Database models shared across the admin repository.

use chrono::NaiveDateTime;

use crate::domain::AuditStamp;
use crate::domain::types::UserId;

#[cfg(feature = "server")]
pub mod auth;
pub mod cache;
#[cfg(feature = "server")]
pub mod config;
pub mod employee;
pub mod enquiry;
pub mod permission;
pub mod permission_group;
pub mod role;
pub mod user;

/// Builds the domain audit stamp from raw audit columns.
///
/// Dangling or zero actor ids (e.g. rows written by seeders) map to `None`.
pub(crate) fn audit_stamp(
    created_by: Option<i32>,
    updated_by: Option<i32>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
) -> AuditStamp {
    AuditStamp {
        created_by: created_by.and_then(|id| UserId::new(id).ok()),
        updated_by: updated_by.and_then(|id| UserId::new(id).ok()),
        created_at,
        updated_at,
    }
}
