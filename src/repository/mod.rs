use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::employee::{EmployeeWithUser, NewEmployee, UpdateEmployee};
use crate::domain::enquiry::{Enquiry, NewEnquiry, UpdateEnquiryRemark};
use crate::domain::permission::{NewPermission, Permission, UpdatePermission};
use crate::domain::permission_group::{
    NewPermissionGroup, PermissionGroup, UpdatePermissionGroup,
};
use crate::domain::role::{NewRole, Role, RoleDetails, UpdateRole};
use crate::domain::types::{
    Email, EmployeeId, EnquiryId, Guard, PermissionGroupId, PermissionId, RoleId, UserId,
    UserStatus,
};
use crate::domain::user::{NewUser, UpdateUser, User, UserAssignments, UserCredentials, UserDetails};
use crate::repository::errors::RepositoryResult;

pub mod cache;
pub mod employee;
pub mod enquiry;
pub mod errors;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod permission;
pub mod permission_group;
pub mod role;
pub mod user;

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Rows to skip; saturates for pages far past the end.
    pub fn offset(&self) -> i64 {
        let skipped = (self.page.max(1) - 1).saturating_mul(self.per_page);
        i64::try_from(skipped).unwrap_or(i64::MAX)
    }

    pub fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }
}

/// Filters shared by every index listing.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a `LIKE` search term; blank terms are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into().trim().to_string();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }

    pub(crate) fn pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| format!("%{term}%"))
    }
}

/// Counters reported by the cache status command and health check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub tags: usize,
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    fn get_user_credentials(&self, email: &Email) -> RepositoryResult<Option<UserCredentials>>;
    fn get_user_details(&self, id: UserId) -> RepositoryResult<Option<UserDetails>>;
    fn list_users(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<User>)>;
    fn list_user_roles(&self, id: UserId) -> RepositoryResult<Vec<Role>>;
    /// Direct permissions merged with those of every role the user holds.
    fn list_user_permissions(&self, id: UserId) -> RepositoryResult<Vec<Permission>>;
    fn count_users(&self) -> RepositoryResult<usize>;
}

pub trait UserWriter {
    fn create_user(
        &self,
        new_user: &NewUser,
        assignments: &UserAssignments,
    ) -> RepositoryResult<User>;
    fn update_user(
        &self,
        id: UserId,
        updates: &UpdateUser,
        assignments: &UserAssignments,
    ) -> RepositoryResult<User>;
    fn set_user_status(
        &self,
        id: UserId,
        status: UserStatus,
        actor: Option<UserId>,
    ) -> RepositoryResult<User>;
    fn delete_user(&self, id: UserId, actor: Option<UserId>) -> RepositoryResult<()>;
}

pub trait RoleReader {
    fn get_role_by_id(&self, id: RoleId) -> RepositoryResult<Option<Role>>;
    fn get_role_details(&self, id: RoleId) -> RepositoryResult<Option<RoleDetails>>;
    fn list_roles(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Role>)>;
    fn list_all_roles(&self, guard: Option<Guard>) -> RepositoryResult<Vec<Role>>;
    fn count_roles(&self) -> RepositoryResult<usize>;
}

pub trait RoleWriter {
    fn create_role(&self, new_role: &NewRole, permission_ids: &[PermissionId])
    -> RepositoryResult<Role>;
    fn update_role(
        &self,
        id: RoleId,
        updates: &UpdateRole,
        permission_ids: &[PermissionId],
    ) -> RepositoryResult<Role>;
    fn delete_role(&self, id: RoleId) -> RepositoryResult<()>;
}

pub trait PermissionReader {
    fn get_permission_by_id(&self, id: PermissionId) -> RepositoryResult<Option<Permission>>;
    fn list_permissions(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Permission>)>;
    fn list_all_permissions(&self, guard: Option<Guard>) -> RepositoryResult<Vec<Permission>>;
    fn count_permissions(&self) -> RepositoryResult<usize>;
}

pub trait PermissionWriter {
    fn create_permission(&self, new_permission: &NewPermission) -> RepositoryResult<Permission>;
    fn update_permission(
        &self,
        id: PermissionId,
        updates: &UpdatePermission,
    ) -> RepositoryResult<Permission>;
    fn delete_permission(&self, id: PermissionId) -> RepositoryResult<()>;
}

pub trait PermissionGroupReader {
    fn get_permission_group_by_id(
        &self,
        id: PermissionGroupId,
    ) -> RepositoryResult<Option<PermissionGroup>>;
    fn list_permission_groups(
        &self,
        query: ListQuery,
    ) -> RepositoryResult<(usize, Vec<PermissionGroup>)>;
    fn list_all_permission_groups(&self) -> RepositoryResult<Vec<PermissionGroup>>;
    fn count_permission_groups(&self) -> RepositoryResult<usize>;
}

pub trait PermissionGroupWriter {
    fn create_permission_group(
        &self,
        new_group: &NewPermissionGroup,
    ) -> RepositoryResult<PermissionGroup>;
    fn update_permission_group(
        &self,
        id: PermissionGroupId,
        updates: &UpdatePermissionGroup,
    ) -> RepositoryResult<PermissionGroup>;
    fn delete_permission_group(&self, id: PermissionGroupId) -> RepositoryResult<()>;
}

pub trait EmployeeReader {
    fn get_employee_by_id(&self, id: EmployeeId) -> RepositoryResult<Option<EmployeeWithUser>>;
    fn list_employees(&self, query: ListQuery)
    -> RepositoryResult<(usize, Vec<EmployeeWithUser>)>;
    fn count_employees(&self) -> RepositoryResult<usize>;
}

pub trait EmployeeWriter {
    /// Creates the user account and its employee profile in one transaction.
    fn create_employee(&self, new_employee: &NewEmployee) -> RepositoryResult<EmployeeWithUser>;
    fn update_employee(
        &self,
        id: EmployeeId,
        updates: &UpdateEmployee,
    ) -> RepositoryResult<EmployeeWithUser>;
    /// Soft-deletes the employee together with its user account.
    fn delete_employee(&self, id: EmployeeId, actor: Option<UserId>) -> RepositoryResult<()>;
}

pub trait EnquiryReader {
    fn get_enquiry_by_id(&self, id: EnquiryId) -> RepositoryResult<Option<Enquiry>>;
    fn list_enquiries(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Enquiry>)>;
    fn count_enquiries(&self) -> RepositoryResult<usize>;
}

pub trait EnquiryWriter {
    fn create_enquiry(&self, new_enquiry: &NewEnquiry) -> RepositoryResult<Enquiry>;
    fn update_enquiry_remark(
        &self,
        id: EnquiryId,
        updates: &UpdateEnquiryRemark,
    ) -> RepositoryResult<Enquiry>;
    fn delete_enquiry(&self, id: EnquiryId, actor: Option<UserId>) -> RepositoryResult<()>;
}

/// Every reader needed to compute record counts across the admin entities.
pub trait StatsReader:
    UserReader
    + RoleReader
    + PermissionReader
    + PermissionGroupReader
    + EmployeeReader
    + EnquiryReader
{
}

impl<T> StatsReader for T where
    T: UserReader
        + RoleReader
        + PermissionReader
        + PermissionGroupReader
        + EmployeeReader
        + EnquiryReader
        + ?Sized
{
}

pub trait CacheReader {
    /// Returns the stored value unless it is missing or expired at `now`.
    fn get_cache_value(&self, key: &str, now: NaiveDateTime) -> RepositoryResult<Option<String>>;
    fn cache_stats(&self, now: NaiveDateTime) -> RepositoryResult<CacheStats>;
}

pub trait CacheWriter {
    fn put_cache_value(
        &self,
        key: &str,
        value: &str,
        expires_at: Option<NaiveDateTime>,
        tags: &[String],
    ) -> RepositoryResult<()>;
    fn forget_cache_value(&self, key: &str) -> RepositoryResult<bool>;
    fn flush_cache_tags(&self, tags: &[String]) -> RepositoryResult<usize>;
    fn flush_cache(&self) -> RepositoryResult<usize>;
    fn prune_expired_cache(&self, now: NaiveDateTime) -> RepositoryResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_saturates_for_huge_pages() {
        let query = ListQuery::new().paginate(usize::MAX, 15);
        let pagination = query.pagination.unwrap();
        assert_eq!(pagination.offset(), i64::MAX);

        let pagination = Pagination {
            page: 1 << 62,
            per_page: 15,
        };
        assert_eq!(pagination.offset(), i64::MAX);
        assert_eq!(Pagination { page: 3, per_page: 15 }.offset(), 30);
    }
}
