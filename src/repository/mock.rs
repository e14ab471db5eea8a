//! Mock repository implementations for isolating services in tests.

use chrono::NaiveDateTime;
use mockall::mock;

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
use crate::repository::{
    CacheReader, CacheStats, CacheWriter, EmployeeReader, EmployeeWriter, EnquiryReader,
    EnquiryWriter, ListQuery, PermissionGroupReader, PermissionGroupWriter, PermissionReader,
    PermissionWriter, RoleReader, RoleWriter, UserReader, UserWriter,
};

mock! {
    pub Repository {}

    impl UserReader for Repository {
        fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
        fn get_user_credentials(&self, email: &Email) -> RepositoryResult<Option<UserCredentials>>;
        fn get_user_details(&self, id: UserId) -> RepositoryResult<Option<UserDetails>>;
        fn list_users(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<User>)>;
        fn list_user_roles(&self, id: UserId) -> RepositoryResult<Vec<Role>>;
        fn list_user_permissions(&self, id: UserId) -> RepositoryResult<Vec<Permission>>;
        fn count_users(&self) -> RepositoryResult<usize>;
    }

    impl UserWriter for Repository {
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

    impl RoleReader for Repository {
        fn get_role_by_id(&self, id: RoleId) -> RepositoryResult<Option<Role>>;
        fn get_role_details(&self, id: RoleId) -> RepositoryResult<Option<RoleDetails>>;
        fn list_roles(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Role>)>;
        fn list_all_roles(&self, guard: Option<Guard>) -> RepositoryResult<Vec<Role>>;
        fn count_roles(&self) -> RepositoryResult<usize>;
    }

    impl RoleWriter for Repository {
        fn create_role(
            &self,
            new_role: &NewRole,
            permission_ids: &[PermissionId],
        ) -> RepositoryResult<Role>;
        fn update_role(
            &self,
            id: RoleId,
            updates: &UpdateRole,
            permission_ids: &[PermissionId],
        ) -> RepositoryResult<Role>;
        fn delete_role(&self, id: RoleId) -> RepositoryResult<()>;
    }

    impl PermissionReader for Repository {
        fn get_permission_by_id(&self, id: PermissionId) -> RepositoryResult<Option<Permission>>;
        fn list_permissions(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Permission>)>;
        fn list_all_permissions(&self, guard: Option<Guard>) -> RepositoryResult<Vec<Permission>>;
        fn count_permissions(&self) -> RepositoryResult<usize>;
    }

    impl PermissionWriter for Repository {
        fn create_permission(&self, new_permission: &NewPermission) -> RepositoryResult<Permission>;
        fn update_permission(
            &self,
            id: PermissionId,
            updates: &UpdatePermission,
        ) -> RepositoryResult<Permission>;
        fn delete_permission(&self, id: PermissionId) -> RepositoryResult<()>;
    }

    impl PermissionGroupReader for Repository {
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

    impl PermissionGroupWriter for Repository {
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

    impl EmployeeReader for Repository {
        fn get_employee_by_id(&self, id: EmployeeId) -> RepositoryResult<Option<EmployeeWithUser>>;
        fn list_employees(
            &self,
            query: ListQuery,
        ) -> RepositoryResult<(usize, Vec<EmployeeWithUser>)>;
        fn count_employees(&self) -> RepositoryResult<usize>;
    }

    impl EmployeeWriter for Repository {
        fn create_employee(&self, new_employee: &NewEmployee) -> RepositoryResult<EmployeeWithUser>;
        fn update_employee(
            &self,
            id: EmployeeId,
            updates: &UpdateEmployee,
        ) -> RepositoryResult<EmployeeWithUser>;
        fn delete_employee(&self, id: EmployeeId, actor: Option<UserId>) -> RepositoryResult<()>;
    }

    impl EnquiryReader for Repository {
        fn get_enquiry_by_id(&self, id: EnquiryId) -> RepositoryResult<Option<Enquiry>>;
        fn list_enquiries(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Enquiry>)>;
        fn count_enquiries(&self) -> RepositoryResult<usize>;
    }

    impl EnquiryWriter for Repository {
        fn create_enquiry(&self, new_enquiry: &NewEnquiry) -> RepositoryResult<Enquiry>;
        fn update_enquiry_remark(
            &self,
            id: EnquiryId,
            updates: &UpdateEnquiryRemark,
        ) -> RepositoryResult<Enquiry>;
        fn delete_enquiry(&self, id: EnquiryId, actor: Option<UserId>) -> RepositoryResult<()>;
    }

    impl CacheReader for Repository {
        fn get_cache_value(
            &self,
            key: &str,
            now: NaiveDateTime,
        ) -> RepositoryResult<Option<String>>;
        fn cache_stats(&self, now: NaiveDateTime) -> RepositoryResult<CacheStats>;
    }

    impl CacheWriter for Repository {
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
}
