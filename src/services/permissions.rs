//! Services behind the permission administration screens.

use chrono::Duration;

use crate::domain::permission::{NewPermission, Permission, UpdatePermission};
use crate::domain::types::{ControllerKey, Guard, PermissionGroupId, PermissionId};
use crate::dto::permissions::{PermissionEditData, PermissionFormOptions};
use crate::dto::{IndexFilters, IndexPageData};
use crate::forms::IndexParams;
use crate::forms::permissions::{PermissionForm, PermissionPayload};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{
    CacheReader, CacheWriter, ListQuery, PermissionGroupReader, PermissionReader,
    PermissionWriter,
};
use crate::services::cache::{PERMISSION_GROUPS_KEY, QueryCache, invalidate};
use crate::services::{PER_PAGE, ServiceError, ServiceResult};

const TAGS: &[&str] = &["permissions", "roles", "users", "dashboard"];

pub fn list_permissions<R>(
    repo: &R,
    params: &IndexParams,
) -> ServiceResult<IndexPageData<Permission>>
where
    R: PermissionReader + ?Sized,
{
    let page = params.page();
    let (total, permissions) = repo.list_permissions(
        ListQuery::new()
            .search(params.search())
            .paginate(page, PER_PAGE),
    )?;

    Ok(IndexPageData {
        records: Paginated::new(permissions, page, total, PER_PAGE),
        filters: IndexFilters {
            search: params.search().to_string(),
        },
    })
}

pub fn load_form_options<R>(repo: &R, default_ttl: Duration) -> ServiceResult<PermissionFormOptions>
where
    R: PermissionGroupReader + CacheReader + CacheWriter + ?Sized,
{
    let groups = QueryCache::new(repo, default_ttl).remember(
        PERMISSION_GROUPS_KEY,
        &["permission-groups"],
        None,
        || Ok(repo.list_all_permission_groups()?),
    )?;
    Ok(PermissionFormOptions {
        groups,
        guards: vec![Guard::Web.as_str(), Guard::Api.as_str()],
    })
}

pub fn show_permission<R>(repo: &R, id: i32) -> ServiceResult<Permission>
where
    R: PermissionReader + ?Sized,
{
    let id = PermissionId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_permission_by_id(id)?.ok_or(ServiceError::NotFound)
}

pub fn load_permission_edit<R>(
    repo: &R,
    id: i32,
    default_ttl: Duration,
) -> ServiceResult<PermissionEditData>
where
    R: PermissionReader + PermissionGroupReader + CacheReader + CacheWriter + ?Sized,
{
    Ok(PermissionEditData {
        permission: show_permission(repo, id)?,
        options: load_form_options(repo, default_ttl)?,
    })
}

/// Picks the explicit controller, else the one of the chosen group.
fn resolve_controller<R>(
    repo: &R,
    group_id: Option<PermissionGroupId>,
    controller: Option<ControllerKey>,
) -> ServiceResult<ControllerKey>
where
    R: PermissionGroupReader + ?Sized,
{
    let group = match group_id {
        Some(group_id) => Some(repo.get_permission_group_by_id(group_id)?.ok_or_else(|| {
            ServiceError::field(
                "permission_group_id",
                "The selected permission group is invalid.",
            )
        })?),
        None => None,
    };

    controller
        .or_else(|| group.and_then(|group| group.controller))
        .ok_or_else(|| {
            ServiceError::field(
                "controller",
                "The controller field is required when the group has no controller.",
            )
        })
}

pub fn create_permission<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: PermissionForm,
) -> ServiceResult<Permission>
where
    R: PermissionGroupReader + PermissionWriter + CacheWriter + ?Sized,
{
    let PermissionPayload {
        name,
        guard,
        group_id,
        controller,
        methods,
    } = PermissionPayload::try_from(form)?;
    let controller = resolve_controller(repo, group_id, controller)?;

    let permission = repo.create_permission(&NewPermission {
        name,
        guard,
        group_id,
        controller,
        methods,
        created_by: user.user_id().ok(),
    })?;
    invalidate(repo, TAGS);
    Ok(permission)
}

pub fn update_permission<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: PermissionForm,
) -> ServiceResult<Permission>
where
    R: PermissionReader + PermissionGroupReader + PermissionWriter + CacheWriter + ?Sized,
{
    let id = PermissionId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_permission_by_id(id)?.ok_or(ServiceError::NotFound)?;

    let PermissionPayload {
        name,
        guard,
        group_id,
        controller,
        methods,
    } = PermissionPayload::try_from(form)?;
    let controller = resolve_controller(repo, group_id, controller)?;

    let permission = repo.update_permission(
        id,
        &UpdatePermission {
            name,
            guard,
            group_id,
            controller,
            methods,
            updated_by: user.user_id().ok(),
        },
    )?;
    invalidate(repo, TAGS);
    Ok(permission)
}

pub fn delete_permission<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: PermissionWriter + CacheWriter + ?Sized,
{
    let id = PermissionId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.delete_permission(id)?;
    invalidate(repo, TAGS);
    log::info!("Permission {} deleted by {}", id, user.sub);
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::AuditStamp;
    use crate::domain::permission_group::PermissionGroup;
    use crate::domain::types::{PermissionGroupName, PermissionName, parse_actions};
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

    fn group(controller: Option<&str>) -> PermissionGroup {
        PermissionGroup {
            id: PermissionGroupId::new(1).unwrap(),
            name: PermissionGroupName::new("Reports").unwrap(),
            controller: controller.map(|c| ControllerKey::new(c).unwrap()),
            audit: AuditStamp::default(),
        }
    }

    fn form(controller: Option<&str>) -> PermissionForm {
        PermissionForm {
            name: "reports-list".into(),
            guard_name: None,
            permission_group_id: Some(1),
            controller: controller.map(str::to_string),
            methods: "index,show".into(),
        }
    }

    fn stored(controller: &str) -> Permission {
        Permission {
            id: PermissionId::new(9).unwrap(),
            name: PermissionName::new("reports-list").unwrap(),
            guard: Guard::Web,
            group_id: PermissionGroupId::new(1).ok(),
            controller: ControllerKey::new(controller).unwrap(),
            methods: parse_actions("index,show").unwrap(),
            audit: AuditStamp::default(),
        }
    }

    #[test]
    fn blank_controller_falls_back_to_group() {
        let mut repo = MockRepository::new();
        repo.expect_get_permission_group_by_id()
            .returning(|_| Ok(Some(group(Some("reports")))));
        repo.expect_create_permission()
            .withf(|new| new.controller.as_str() == "reports" && new.methods.len() == 2)
            .times(1)
            .returning(|_| Ok(stored("reports")));
        repo.expect_flush_cache_tags().returning(|_| Ok(0));

        create_permission(&repo, &admin(), form(None)).unwrap();
    }

    #[test]
    fn explicit_controller_wins_over_group() {
        let mut repo = MockRepository::new();
        repo.expect_get_permission_group_by_id()
            .returning(|_| Ok(Some(group(Some("reports")))));
        repo.expect_create_permission()
            .withf(|new| new.controller.as_str() == "exports")
            .times(1)
            .returning(|_| Ok(stored("exports")));
        repo.expect_flush_cache_tags().returning(|_| Ok(0));

        create_permission(&repo, &admin(), form(Some("Exports"))).unwrap();
    }

    #[test]
    fn missing_controller_everywhere_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_permission_group_by_id()
            .returning(|_| Ok(Some(group(None))));
        repo.expect_create_permission().times(0);

        let result = create_permission(&repo, &admin(), form(None));

        assert!(matches!(

            result,

            Err(ServiceError::Validation(errors)) if errors.contains_key("controller")

        ));
    }

    #[test]
    fn unknown_group_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_permission_group_by_id().returning(|_| Ok(None));
        repo.expect_create_permission().times(0);

        let result = create_permission(&repo, &admin(), form(Some("reports")));

        assert!(matches!(

            result,

            Err(ServiceError::Validation(errors)) if errors.contains_key("permission_group_id")

        ));
    }
}
