//! Business logic shared by the HTTP handlers and the console.

pub mod access;
pub mod auth;
pub mod backup;
pub mod cache;
pub mod dashboard;
pub mod employees;
pub mod enquiries;
pub mod errors;
pub mod health;
pub mod permission_groups;
pub mod permissions;
pub mod roles;
pub mod users;

pub use errors::{ServiceError, ServiceResult};

/// Rows per index page.
pub const PER_PAGE: usize = 15;
