use serde::{Deserialize, Serialize};

use crate::domain::AuditStamp;
use crate::domain::permission::Permission;
use crate::domain::role::Role;
use crate::domain::types::{Email, PermissionId, PersonName, RoleId, UserId, UserStatus};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: PersonName,
    pub email: Email,
    pub status: UserStatus,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

/// User record together with its stored password hash, used only for login.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// User with the roles and direct permissions assigned to it.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: PersonName,
    pub email: Email,
    pub password_hash: String,
    pub status: UserStatus,
    pub created_by: Option<UserId>,
}

#[derive(Clone, Debug)]
pub struct UpdateUser {
    pub name: PersonName,
    pub email: Email,
    /// New password hash; `None` keeps the current one.
    pub password_hash: Option<String>,
    pub status: UserStatus,
    pub updated_by: Option<UserId>,
}

/// Role and direct permission assignments synchronised alongside a user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserAssignments {
    pub role_ids: Vec<RoleId>,
    pub permission_ids: Vec<PermissionId>,
}
