use crate::domain::permission_group::{
    NewPermissionGroup, PermissionGroup, UpdatePermissionGroup,
};
use crate::domain::types::PermissionGroupId;
use crate::dto::{IndexFilters, IndexPageData};
use crate::forms::IndexParams;
use crate::forms::permission_groups::{PermissionGroupForm, PermissionGroupPayload};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{CacheWriter, ListQuery, PermissionGroupReader, PermissionGroupWriter};
use crate::services::cache::invalidate;
use crate::services::{PER_PAGE, ServiceError, ServiceResult};

const TAGS: &[&str] = &["permission-groups", "permissions", "dashboard"];

pub fn list_permission_groups<R>(
    repo: &R,
    params: &IndexParams,
) -> ServiceResult<IndexPageData<PermissionGroup>>
where
    R: PermissionGroupReader + ?Sized,
{
    let page = params.page();
    let (total, groups) = repo.list_permission_groups(
        ListQuery::new()
            .search(params.search())
            .paginate(page, PER_PAGE),
    )?;

    Ok(IndexPageData {
        records: Paginated::new(groups, page, total, PER_PAGE),
        filters: IndexFilters {
            search: params.search().to_string(),
        },
    })
}

pub fn show_permission_group<R>(repo: &R, id: i32) -> ServiceResult<PermissionGroup>
where
    R: PermissionGroupReader + ?Sized,
{
    let id = PermissionGroupId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_permission_group_by_id(id)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_permission_group<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: PermissionGroupForm,
) -> ServiceResult<PermissionGroup>
where
    R: PermissionGroupWriter + CacheWriter + ?Sized,
{
    let payload = PermissionGroupPayload::try_from(form)?;
    let group = repo.create_permission_group(&NewPermissionGroup {
        name: payload.name,
        controller: payload.controller,
        created_by: user.user_id().ok(),
    })?;
    invalidate(repo, TAGS);
    Ok(group)
}

pub fn update_permission_group<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: PermissionGroupForm,
) -> ServiceResult<PermissionGroup>
where
    R: PermissionGroupWriter + CacheWriter + ?Sized,
{
    let id = PermissionGroupId::new(id).map_err(|_| ServiceError::NotFound)?;
    let payload = PermissionGroupPayload::try_from(form)?;
    let group = repo.update_permission_group(
        id,
        &UpdatePermissionGroup {
            name: payload.name,
            controller: payload.controller,
            updated_by: user.user_id().ok(),
        },
    )?;
    invalidate(repo, TAGS);
    Ok(group)
}

/// Deletes the group; its permissions stay and lose the group reference.
pub fn delete_permission_group<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<()>
where
    R: PermissionGroupWriter + CacheWriter + ?Sized,
{
    let id = PermissionGroupId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.delete_permission_group(id)?;
    invalidate(repo, TAGS);
    log::info!("Permission group {} deleted by {}", id, user.sub);
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
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

    #[test]
    fn duplicate_name_is_a_field_error() {
        let mut repo = MockRepository::new();
        repo.expect_create_permission_group().returning(|_| {
            Err(RepositoryError::ConstraintViolation(
                "Unique constraint violation: UNIQUE constraint failed: permission_groups.name"
                    .into(),
            ))
        });

        let result = create_permission_group(
            &repo,
            &admin(),
            PermissionGroupForm {
                name: "Users".into(),
                controller: Some("users".into()),
            },
        );

        assert!(matches!(

            result,

            Err(ServiceError::Validation(errors)) if errors.contains_key("name")

        ));
    }

    #[test]
    fn deleting_missing_group_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_delete_permission_group()
            .returning(|_| Err(RepositoryError::NotFound));

        let result = delete_permission_group(&repo, &admin(), 42);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }
}
