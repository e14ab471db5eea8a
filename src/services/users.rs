//! Services behind the user administration screens.

use chrono::Duration;

use crate::domain::types::{UserId, UserStatus};
use crate::domain::user::{NewUser, UpdateUser, User, UserDetails};
use crate::dto::users::{UserEditData, UserFormOptions};
use crate::dto::{IndexFilters, IndexPageData, SelectOption};
use crate::forms::IndexParams;
use crate::forms::users::UserForm;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{
    CacheReader, CacheWriter, ListQuery, PermissionReader, RoleReader, UserReader, UserWriter,
};
use crate::services::auth::hash_password;
use crate::services::cache::{QueryCache, ROLE_OPTIONS_KEY, invalidate, role_options};
use crate::services::{PER_PAGE, ServiceError, ServiceResult};

const TAGS: &[&str] = &["users", "dashboard"];

fn actor(user: &AuthenticatedUser) -> Option<UserId> {
    user.user_id().ok()
}

/// Refuses actions a signed-in user may not run on their own account.
fn ensure_not_self(user: &AuthenticatedUser, id: UserId, message: &str) -> ServiceResult<()> {
    if actor(user) == Some(id) {
        return Err(ServiceError::Form(message.to_string()));
    }
    Ok(())
}

pub fn list_users<R>(repo: &R, params: &IndexParams) -> ServiceResult<IndexPageData<User>>
where
    R: UserReader + ?Sized,
{
    let page = params.page();
    let (total, users) = repo.list_users(
        ListQuery::new()
            .search(params.search())
            .paginate(page, PER_PAGE),
    )?;

    Ok(IndexPageData {
        records: Paginated::new(users, page, total, PER_PAGE),
        filters: IndexFilters {
            search: params.search().to_string(),
        },
    })
}

/// Role options come from the query cache; permissions are read directly.
pub fn load_form_options<R>(repo: &R, default_ttl: Duration) -> ServiceResult<UserFormOptions>
where
    R: RoleReader + PermissionReader + CacheReader + CacheWriter + ?Sized,
{
    let roles = QueryCache::new(repo, default_ttl).remember(
        ROLE_OPTIONS_KEY,
        &["roles"],
        None,
        || role_options(repo),
    )?;
    let permissions = repo
        .list_all_permissions(None)?
        .into_iter()
        .map(|permission| SelectOption {
            value: permission.id.get(),
            label: format!("{} ({})", permission.name.as_str(), permission.guard),
        })
        .collect();

    Ok(UserFormOptions { roles, permissions })
}

pub fn show_user<R>(repo: &R, id: i32) -> ServiceResult<UserDetails>
where
    R: UserReader + ?Sized,
{
    let id = UserId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_user_details(id)?.ok_or(ServiceError::NotFound)
}

pub fn load_user_edit<R>(repo: &R, id: i32, default_ttl: Duration) -> ServiceResult<UserEditData>
where
    R: UserReader + RoleReader + PermissionReader + CacheReader + CacheWriter + ?Sized,
{
    let user = show_user(repo, id)?;
    let options = load_form_options(repo, default_ttl)?;
    Ok(UserEditData { user, options })
}

pub fn create_user<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: UserForm,
    bcrypt_cost: u32,
) -> ServiceResult<User>
where
    R: UserWriter + CacheWriter + ?Sized,
{
    let payload = form.into_payload(true)?;
    let password = payload
        .password
        .ok_or_else(|| ServiceError::field("password", "The password field is required."))?;

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        password_hash: hash_password(&password, bcrypt_cost)?,
        status: payload.status,
        created_by: actor(user),
    };
    let created = repo.create_user(&new_user, &payload.assignments)?;
    invalidate(repo, TAGS);

    log::info!("User {} created by {}", created.id, user.sub);
    Ok(created)
}

pub fn update_user<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: UserForm,
    bcrypt_cost: u32,
) -> ServiceResult<User>
where
    R: UserReader + UserWriter + CacheWriter + ?Sized,
{
    let id = UserId::new(id).map_err(|_| ServiceError::NotFound)?;
    let existing = repo.get_user_by_id(id)?.ok_or(ServiceError::NotFound)?;
    let payload = form.into_payload(false)?;

    // Deactivating oneself through the edit form is refused like the toggle.
    if payload.status != existing.status && payload.status == UserStatus::Inactive {
        ensure_not_self(user, id, "You cannot deactivate your own account.")?;
    }

    let password_hash = payload
        .password
        .as_deref()
        .map(|password| hash_password(password, bcrypt_cost))
        .transpose()?;
    let updates = UpdateUser {
        name: payload.name,
        email: payload.email,
        password_hash,
        status: payload.status,
        updated_by: actor(user),
    };
    let updated = repo.update_user(id, &updates, &payload.assignments)?;
    invalidate(repo, TAGS);

    Ok(updated)
}

pub fn toggle_user_status<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<User>
where
    R: UserReader + UserWriter + CacheWriter + ?Sized,
{
    let id = UserId::new(id).map_err(|_| ServiceError::NotFound)?;
    ensure_not_self(user, id, "You cannot change the status of your own account.")?;

    let existing = repo.get_user_by_id(id)?.ok_or(ServiceError::NotFound)?;
    let updated = repo.set_user_status(id, existing.status.toggled(), actor(user))?;
    invalidate(repo, TAGS);

    log::info!("User {} is now {} (by {})", id, updated.status, user.sub);
    Ok(updated)
}

pub fn delete_user<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: UserWriter + CacheWriter + ?Sized,
{
    let id = UserId::new(id).map_err(|_| ServiceError::NotFound)?;
    ensure_not_self(user, id, "You cannot delete your own account.")?;

    repo.delete_user(id, actor(user))?;
    invalidate(repo, &["users", "employees", "dashboard"]);

    log::info!("User {} deleted by {}", id, user.sub);
    Ok(())
}
