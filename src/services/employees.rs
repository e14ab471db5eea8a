//! Services for employees. Every employee owns a user account; both are
//! written together.

use crate::domain::employee::{EmployeeWithUser, NewEmployee, UpdateEmployee};
use crate::domain::types::{EmployeeId, UserStatus};
use crate::domain::user::{NewUser, UpdateUser};
use crate::dto::{IndexFilters, IndexPageData};
use crate::forms::IndexParams;
use crate::forms::employees::EmployeeForm;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{CacheWriter, EmployeeReader, EmployeeWriter, ListQuery};
use crate::services::auth::hash_password;
use crate::services::cache::invalidate;
use crate::services::{PER_PAGE, ServiceError, ServiceResult};

const TAGS: &[&str] = &["employees", "users", "dashboard"];

pub fn list_employees<R>(
    repo: &R,
    params: &IndexParams,
) -> ServiceResult<IndexPageData<EmployeeWithUser>>
where
    R: EmployeeReader + ?Sized,
{
    let page = params.page();
    let (total, employees) = repo.list_employees(
        ListQuery::new()
            .search(params.search())
            .paginate(page, PER_PAGE),
    )?;

    Ok(IndexPageData {
        records: Paginated::new(employees, page, total, PER_PAGE),
        filters: IndexFilters {
            search: params.search().to_string(),
        },
    })
}

pub fn show_employee<R>(repo: &R, id: i32) -> ServiceResult<EmployeeWithUser>
where
    R: EmployeeReader + ?Sized,
{
    let id = EmployeeId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_employee_by_id(id)?.ok_or(ServiceError::NotFound)
}

pub fn create_employee<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: EmployeeForm,
    bcrypt_cost: u32,
) -> ServiceResult<EmployeeWithUser>
where
    R: EmployeeWriter + CacheWriter + ?Sized,
{
    let payload = form.into_payload(true)?;
    let password = payload
        .password
        .ok_or_else(|| ServiceError::field("password", "The password field is required."))?;
    let actor = user.user_id().ok();

    let employee = repo.create_employee(&NewEmployee {
        user: NewUser {
            name: payload.name,
            email: payload.email,
            password_hash: hash_password(&password, bcrypt_cost)?,
            status: UserStatus::Active,
            created_by: actor,
        },
        profile: payload.profile,
        created_by: actor,
    })?;
    invalidate(repo, TAGS);

    log::info!(
        "Employee {} ({}) created by {}",
        employee.employee.id,
        employee.employee.employee_code,
        user.sub
    );
    Ok(employee)
}

/// Updates the profile and the account. The account status is kept.
pub fn update_employee<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: EmployeeForm,
    bcrypt_cost: u32,
) -> ServiceResult<EmployeeWithUser>
where
    R: EmployeeReader + EmployeeWriter + CacheWriter + ?Sized,
{
    let id = EmployeeId::new(id).map_err(|_| ServiceError::NotFound)?;
    let existing = repo.get_employee_by_id(id)?.ok_or(ServiceError::NotFound)?;
    let payload = form.into_payload(false)?;
    let actor = user.user_id().ok();

    let password_hash = payload
        .password
        .as_deref()
        .map(|password| hash_password(password, bcrypt_cost))
        .transpose()?;
    let employee = repo.update_employee(
        id,
        &UpdateEmployee {
            user: UpdateUser {
                name: payload.name,
                email: payload.email,
                password_hash,
                status: existing.user.status,
                updated_by: actor,
            },
            profile: payload.profile,
            updated_by: actor,
        },
    )?;
    invalidate(repo, TAGS);
    Ok(employee)
}

pub fn delete_employee<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: EmployeeReader + EmployeeWriter + CacheWriter + ?Sized,
{
    let id = EmployeeId::new(id).map_err(|_| ServiceError::NotFound)?;
    let existing = repo.get_employee_by_id(id)?.ok_or(ServiceError::NotFound)?;
    if user.user_id().ok() == Some(existing.user.id) {
        return Err(ServiceError::Form(
            "You cannot delete your own account.".to_string(),
        ));
    }

    repo.delete_employee(id, user.user_id().ok())?;
    invalidate(repo, TAGS);
    log::info!("Employee {} deleted by {}", id, user.sub);
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::AuditStamp;
    use crate::domain::employee::Employee;
    use crate::domain::types::{Email, EmployeeCode, PersonName, UserId};
    use crate::domain::user::User;
    use crate::repository::mock::MockRepository;

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".into(),
            email: "admin@example.com".into(),
            name: "Admin".into(),
            roles: vec![],
            exp: 0,
        }
    }

    fn stored(user_id: i32, status: UserStatus) -> EmployeeWithUser {
        EmployeeWithUser {
            employee: Employee {
                id: EmployeeId::new(3).unwrap(),
                user_id: UserId::new(user_id).unwrap(),
                employee_code: EmployeeCode::new("EMP-001").unwrap(),
                phone: None,
                designation: None,
                department: None,
                address: None,
                joining_date: None,
                audit: AuditStamp::default(),
            },
            user: User {
                id: UserId::new(user_id).unwrap(),
                name: PersonName::new("John").unwrap(),
                email: Email::new("john@example.com").unwrap(),
                status,
                audit: AuditStamp::default(),
            },
        }
    }

    fn form(password: Option<&str>) -> EmployeeForm {
        EmployeeForm {
            name: "John".into(),
            email: "john@example.com".into(),
            password: password.map(str::to_string),
            password_confirmation: password.map(str::to_string),
            employee_code: "EMP-001".into(),
            phone: None,
            designation: Some("Engineer".into()),
            department: None,
            address: None,
            joining_date: None,
        }
    }

    #[test]
    fn create_builds_account_and_profile() {
        let mut repo = MockRepository::new();
        repo.expect_create_employee()
            .withf(|new| {
                new.user.status == UserStatus::Active
                    && new.user.created_by == UserId::new(1).ok()
                    && new.profile.designation.as_deref() == Some("Engineer")
            })
            .times(1)
            .returning(|_| Ok(stored(8, UserStatus::Active)));
        repo.expect_flush_cache_tags().returning(|_| Ok(0));

        create_employee(&repo, &admin(), form(Some("password1")), 4).unwrap();
    }

    #[test]
    fn update_keeps_account_status() {
        let mut repo = MockRepository::new();
        repo.expect_get_employee_by_id()
            .returning(|_| Ok(Some(stored(8, UserStatus::Inactive))));
        repo.expect_update_employee()
            .withf(|_, updates| {
                updates.user.status == UserStatus::Inactive && updates.user.password_hash.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(stored(8, UserStatus::Inactive)));
        repo.expect_flush_cache_tags().returning(|_| Ok(0));

        update_employee(&repo, &admin(), 3, form(None), 4).unwrap();
    }

    #[test]
    fn own_employee_record_cannot_be_deleted() {
        let mut repo = MockRepository::new();
        repo.expect_get_employee_by_id()
            .returning(|_| Ok(Some(stored(1, UserStatus::Active))));
        repo.expect_delete_employee().times(0);

        let result = delete_employee(&repo, &admin(), 3);

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }
}
