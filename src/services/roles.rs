//! Services behind the role administration screens.

use crate::domain::role::{NewRole, Role, RoleDetails, UpdateRole};
use crate::domain::types::{Guard, RoleId};
use crate::dto::roles::{RoleEditData, RoleFormOptions};
use crate::dto::{IndexFilters, IndexPageData, SelectOption};
use crate::forms::IndexParams;
use crate::forms::roles::{RoleForm, RolePayload};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{CacheWriter, ListQuery, PermissionReader, RoleReader, RoleWriter};
use crate::services::cache::invalidate;
use crate::services::{PER_PAGE, ServiceError, ServiceResult};

/// Role writes also change user claims and permission lookups.
const TAGS: &[&str] = &["roles", "users", "dashboard"];

const GUARDS: [&str; 2] = [Guard::Web.as_str(), Guard::Api.as_str()];

pub fn list_roles<R>(repo: &R, params: &IndexParams) -> ServiceResult<IndexPageData<Role>>
where
    R: RoleReader + ?Sized,
{
    let page = params.page();
    let (total, roles) = repo.list_roles(
        ListQuery::new()
            .search(params.search())
            .paginate(page, PER_PAGE),
    )?;

    Ok(IndexPageData {
        records: Paginated::new(roles, page, total, PER_PAGE),
        filters: IndexFilters {
            search: params.search().to_string(),
        },
    })
}

pub fn load_form_options<R>(repo: &R) -> ServiceResult<RoleFormOptions>
where
    R: PermissionReader + ?Sized,
{
    let permissions = repo
        .list_all_permissions(None)?
        .into_iter()
        .map(|permission| SelectOption {
            value: permission.id.get(),
            label: format!("{} ({})", permission.name.as_str(), permission.guard),
        })
        .collect();

    Ok(RoleFormOptions {
        permissions,
        guards: GUARDS.to_vec(),
    })
}

pub fn show_role<R>(repo: &R, id: i32) -> ServiceResult<RoleDetails>
where
    R: RoleReader + ?Sized,
{
    let id = RoleId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_role_details(id)?.ok_or(ServiceError::NotFound)
}

pub fn load_role_edit<R>(repo: &R, id: i32, super_admin_role: &str) -> ServiceResult<RoleEditData>
where
    R: RoleReader + PermissionReader + ?Sized,
{
    let role = show_role(repo, id)?;
    let locked = role.role.is_super_admin(super_admin_role);
    Ok(RoleEditData {
        role,
        options: load_form_options(repo)?,
        locked,
    })
}

pub fn create_role<R>(repo: &R, user: &AuthenticatedUser, form: RoleForm) -> ServiceResult<Role>
where
    R: RoleWriter + CacheWriter + ?Sized,
{
    let payload = RolePayload::try_from(form)?;
    let new_role = NewRole {
        name: payload.name,
        guard: payload.guard,
        created_by: user.user_id().ok(),
    };

    let role = repo.create_role(&new_role, &payload.permission_ids)?;
    invalidate(repo, TAGS);
    Ok(role)
}

/// Updates a role and replaces its permissions. The super-admin role keeps
/// its name and guard.
pub fn update_role<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: RoleForm,
    super_admin_role: &str,
) -> ServiceResult<Role>
where
    R: RoleReader + RoleWriter + CacheWriter + ?Sized,
{
    let id = RoleId::new(id).map_err(|_| ServiceError::NotFound)?;
    let existing = repo.get_role_by_id(id)?.ok_or(ServiceError::NotFound)?;
    let payload = RolePayload::try_from(form)?;

    if existing.is_super_admin(super_admin_role)
        && (payload.name != existing.name || payload.guard != existing.guard)
    {
        return Err(ServiceError::field(
            "name",
            format!("The {super_admin_role} role cannot be renamed."),
        ));
    }

    let updates = UpdateRole {
        name: payload.name,
        guard: payload.guard,
        updated_by: user.user_id().ok(),
    };
    let role = repo.update_role(id, &updates, &payload.permission_ids)?;
    invalidate(repo, TAGS);
    Ok(role)
}

pub fn delete_role<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    super_admin_role: &str,
) -> ServiceResult<()>
where
    R: RoleReader + RoleWriter + CacheWriter + ?Sized,
{
    let id = RoleId::new(id).map_err(|_| ServiceError::NotFound)?;
    let existing = repo.get_role_by_id(id)?.ok_or(ServiceError::NotFound)?;
    if existing.is_super_admin(super_admin_role) {
        return Err(ServiceError::Form(format!(
            "The {super_admin_role} role cannot be deleted."
        )));
    }

    repo.delete_role(id)?;
    invalidate(repo, TAGS);
    log::info!("Role {} ({}) deleted by {}", existing.name, existing.guard, user.sub);
    Ok(())
}
