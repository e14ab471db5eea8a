//! Permission-gated access check run before every protected handler.

use crate::domain::access::{AccessDecision, Grant, RouteAction, find_grant};
use crate::domain::types::Guard;
use crate::models::auth::AuthenticatedUser;
use crate::repository::UserReader;
use crate::services::{ServiceError, ServiceResult};

/// Message returned to clients whose account was deactivated.
pub const INACTIVE_ACCOUNT: &str = "Your account is inactive.";

/// Decides whether `user` may call `method path` under `guard`.
///
/// `path` is relative to the guard's prefix. Returns
/// [`ServiceError::Unauthorized`] when the account no longer exists and
/// [`ServiceError::Forbidden`] when it is inactive; a missing permission is a
/// [`AccessDecision::Denied`] value, not an error.
pub fn authorize<R>(
    repo: &R,
    user: &AuthenticatedUser,
    guard: Guard,
    method: &str,
    path: &str,
    super_admin_role: &str,
) -> ServiceResult<AccessDecision>
where
    R: UserReader + ?Sized,
{
    let user_id = user.user_id().map_err(|_| ServiceError::Unauthorized)?;

    let Some(account) = repo.get_user_by_id(user_id)? else {
        log::warn!(target: "access", "user={user_id} guard={guard} outcome=unknown-user");
        return Err(ServiceError::Unauthorized);
    };
    if !account.status.is_active() {
        log::warn!(target: "access", "user={user_id} guard={guard} outcome=inactive");
        return Err(ServiceError::Forbidden(INACTIVE_ACCOUNT.to_string()));
    }

    let roles = repo.list_user_roles(user_id)?;
    if roles
        .iter()
        .any(|role| role.guard == guard && role.is_super_admin(super_admin_role))
    {
        log::info!(
            target: "access",
            "user={user_id} guard={guard} route={method} {path} outcome=granted via=super-admin"
        );
        return Ok(AccessDecision::Granted(Grant::SuperAdmin));
    }

    let Some(route) = RouteAction::resolve(method, path) else {
        log::warn!(
            target: "access",
            "user={user_id} guard={guard} route={method} {path} outcome=denied reason=unresolved"
        );
        return Ok(AccessDecision::Denied);
    };

    let permissions = repo.list_user_permissions(user_id)?;
    match find_grant(&permissions, guard, &route) {
        Some(permission) => {
            log::info!(
                target: "access",
                "user={user_id} guard={guard} route={route} outcome=granted via={}",
                permission.name
            );
            Ok(AccessDecision::Granted(Grant::Permission(
                permission.name.as_str().to_string(),
            )))
        }
        None => {
            log::warn!(
                target: "access",
                "user={user_id} guard={guard} route={route} outcome=denied"
            );
            Ok(AccessDecision::Denied)
        }
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::AuditStamp;
    use crate::domain::permission::Permission;
    use crate::domain::role::Role;
    use crate::domain::types::{
        ControllerKey, Email, PermissionId, PermissionName, PersonName, RoleId, RoleName, UserId,
        UserStatus, parse_actions,
    };
    use crate::domain::user::User;
    use crate::repository::mock::MockRepository;

    const SUPER_ADMIN: &str = "Super Admin";

    fn claims() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "7".into(),
            email: "editor@example.com".into(),
            name: "Editor".into(),
            roles: vec![],
            exp: 0,
        }
    }

    fn account(status: UserStatus) -> User {
        User {
            id: UserId::new(7).unwrap(),
            name: PersonName::new("Editor").unwrap(),
            email: Email::new("editor@example.com").unwrap(),
            status,
            audit: AuditStamp::default(),
        }
    }

    fn role(name: &str, guard: Guard) -> Role {
        Role {
            id: RoleId::new(1).unwrap(),
            name: RoleName::new(name).unwrap(),
            guard,
            audit: AuditStamp::default(),
        }
    }

    fn permission(controller: &str, methods: &str, guard: Guard) -> Permission {
        Permission {
            id: PermissionId::new(3).unwrap(),
            name: PermissionName::new(format!("{controller}-{guard}")).unwrap(),
            guard,
            group_id: None,
            controller: ControllerKey::new(controller).unwrap(),
            methods: parse_actions(methods).unwrap(),
            audit: AuditStamp::default(),
        }
    }

    fn repo_with(
        status: UserStatus,
        roles: Vec<Role>,
        permissions: Vec<Permission>,
    ) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(move |_| Ok(Some(account(status))));
        repo.expect_list_user_roles()
            .returning(move |_| Ok(roles.clone()));
        repo.expect_list_user_permissions()
            .returning(move |_| Ok(permissions.clone()));
        repo
    }

    #[test]
    fn permission_on_route_grants() {
        let repo = repo_with(
            UserStatus::Active,
            vec![],
            vec![permission("users", "index,show", Guard::Web)],
        );

        let decision =
            authorize(&repo, &claims(), Guard::Web, "GET", "/users", SUPER_ADMIN).unwrap();

        assert_eq!(
            decision,
            AccessDecision::Granted(Grant::Permission("users-web".into()))
        );
    }

    #[test]
    fn missing_action_denies() {
        let repo = repo_with(
            UserStatus::Active,
            vec![],
            vec![permission("users", "index,show", Guard::Web)],
        );

        let decision =
            authorize(&repo, &claims(), Guard::Web, "DELETE", "/users/4", SUPER_ADMIN).unwrap();

        assert_eq!(decision, AccessDecision::Denied);
    }

    #[test]
    fn permission_of_other_guard_is_ignored() {
        let repo = repo_with(
            UserStatus::Active,
            vec![],
            vec![permission("users", "index", Guard::Api)],
        );

        let decision =
            authorize(&repo, &claims(), Guard::Web, "GET", "/users", SUPER_ADMIN).unwrap();

        assert_eq!(decision, AccessDecision::Denied);
    }

    #[test]
    fn super_admin_bypasses_lookup() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|_| Ok(Some(account(UserStatus::Active))));
        repo.expect_list_user_roles()
            .returning(|_| Ok(vec![role(SUPER_ADMIN, Guard::Web)]));
        repo.expect_list_user_permissions().times(0);

        let decision = authorize(
            &repo,
            &claims(),
            Guard::Web,
            "DELETE",
            "/anything/1",
            SUPER_ADMIN,
        )
        .unwrap();

        assert_eq!(decision, AccessDecision::Granted(Grant::SuperAdmin));
    }

    #[test]
    fn inactive_user_is_rejected_before_lookup() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|_| Ok(Some(account(UserStatus::Inactive))));
        repo.expect_list_user_roles().times(0);
        repo.expect_list_user_permissions().times(0);

        let result = authorize(&repo, &claims(), Guard::Web, "GET", "/users", SUPER_ADMIN);

        assert!(matches!(

            result,

            Err(ServiceError::Forbidden(message)) if message == INACTIVE_ACCOUNT

        ));
    }

    #[test]
    fn deleted_user_is_unauthenticated() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id().returning(|_| Ok(None));

        let result = authorize(&repo, &claims(), Guard::Web, "GET", "/users", SUPER_ADMIN);

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn unresolvable_route_is_denied() {
        let repo = repo_with(UserStatus::Active, vec![], vec![]);

        let decision =
            authorize(&repo, &claims(), Guard::Web, "GET", "/", SUPER_ADMIN).unwrap();

        assert_eq!(decision, AccessDecision::Denied);
    }
}
