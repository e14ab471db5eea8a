//! Credential checks and claim issuing for the web session and API tokens.

use chrono::Duration;

use crate::forms::auth::{LoginForm, LoginPayload};
use crate::models::auth::AuthenticatedUser;
use crate::repository::UserReader;
use crate::services::access::INACTIVE_ACCOUNT;
use crate::services::{ServiceError, ServiceResult};

const BAD_CREDENTIALS: &str = "These credentials do not match our records.";

/// Hashes a new password with the configured bcrypt cost.
pub fn hash_password(password: &str, cost: u32) -> ServiceResult<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {e}")))
}

/// Verifies the credentials and returns the claims for a session or token.
///
/// Stored `$2y$` hashes verify as well as `$2b$` ones.
pub fn login<R>(repo: &R, form: LoginForm, ttl: Duration) -> ServiceResult<AuthenticatedUser>
where
    R: UserReader + ?Sized,
{
    let payload = LoginPayload::try_from(form)?;

    let Some(credentials) = repo.get_user_credentials(&payload.email)? else {
        log::info!("Failed login for unknown email {}", payload.email);
        return Err(ServiceError::field("email", BAD_CREDENTIALS));
    };

    let valid = bcrypt::verify(&payload.password, &credentials.password_hash).map_err(|e| {
        log::error!("Stored password hash of {} is unreadable: {e}", payload.email);
        ServiceError::Internal("Failed to verify password".to_string())
    })?;
    if !valid {
        log::info!("Failed login for {}", payload.email);
        return Err(ServiceError::field("email", BAD_CREDENTIALS));
    }
    if !credentials.user.status.is_active() {
        return Err(ServiceError::field("email", INACTIVE_ACCOUNT));
    }

    let mut roles = repo
        .list_user_roles(credentials.user.id)?
        .into_iter()
        .map(|role| role.name.into_inner())
        .collect::<Vec<_>>();
    roles.sort();
    roles.dedup();

    log::info!("User {} signed in", credentials.user.id);
    Ok(AuthenticatedUser::new(&credentials.user, roles, ttl))
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::AuditStamp;
    use crate::domain::role::Role;
    use crate::domain::types::{Email, Guard, PersonName, RoleId, RoleName, UserId, UserStatus};
    use crate::domain::user::{User, UserCredentials};
    use crate::repository::mock::MockRepository;

    /// Laravel's factory hash of the string `password`.
    const LARAVEL_HASH: &str = "$2y$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

    fn credentials(status: UserStatus) -> UserCredentials {
        UserCredentials {
            user: User {
                id: UserId::new(1).unwrap(),
                name: PersonName::new("Admin").unwrap(),
                email: Email::new("admin@example.com").unwrap(),
                status,
                audit: AuditStamp::default(),
            },
            password_hash: LARAVEL_HASH.to_string(),
        }
    }

    fn form(password: &str) -> LoginForm {
        LoginForm {
            email: "admin@example.com".into(),
            password: password.into(),
        }
    }

    #[test]
    fn laravel_hash_verifies_and_roles_become_claims() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_credentials()
            .returning(|_| Ok(Some(credentials(UserStatus::Active))));
        repo.expect_list_user_roles().returning(|_| {
            Ok(vec![
                Role {
                    id: RoleId::new(1).unwrap(),
                    name: RoleName::new("Super Admin").unwrap(),
                    guard: Guard::Web,
                    audit: AuditStamp::default(),
                },
                Role {
                    id: RoleId::new(2).unwrap(),
                    name: RoleName::new("Super Admin").unwrap(),
                    guard: Guard::Api,
                    audit: AuditStamp::default(),
                },
            ])
        });

        let claims = login(&repo, form("password"), Duration::minutes(5)).unwrap();

        assert_eq!(claims.sub, "1");
        assert_eq!(claims.roles, vec!["Super Admin".to_string()]);
    }

    #[test]
    fn wrong_password_is_a_field_error() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_credentials()
            .returning(|_| Ok(Some(credentials(UserStatus::Active))));
        repo.expect_list_user_roles().times(0);

        let result = login(&repo, form("wrong-password"), Duration::minutes(5));

        assert!(matches!(

            result,

            Err(ServiceError::Validation(errors)) if errors.contains_key("email")

        ));
    }

    #[test]
    fn inactive_account_cannot_sign_in() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_credentials()
            .returning(|_| Ok(Some(credentials(UserStatus::Inactive))));

        let result = login(&repo, form("password"), Duration::minutes(5));

        assert!(matches!(
            result,
            Err(ServiceError::Validation(errors))
                if errors["email"] == vec![INACTIVE_ACCOUNT.to_string()]
        ));
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse", 4).unwrap();
        assert!(bcrypt::verify("correct horse", &hash).unwrap());
    }
}
