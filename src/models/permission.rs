//! Diesel models for permissions.
//!
//! Actions are stored as a comma separated list in the `methods` column.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::permission::{
    NewPermission as DomainNewPermission, Permission as DomainPermission,
    UpdatePermission as DomainUpdatePermission,
};
use crate::domain::types::{
    ControllerKey, PermissionGroupId, PermissionId, PermissionName, TypeConstraintError, UserId,
    join_actions, parse_actions,
};
use crate::models::audit_stamp;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::permissions)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub guard_name: String,
    pub permission_group_id: Option<i32>,
    pub controller: String,
    pub methods: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::permissions)]
pub struct NewPermission<'a> {
    pub name: &'a str,
    pub guard_name: &'a str,
    pub permission_group_id: Option<i32>,
    pub controller: &'a str,
    pub methods: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::permissions)]
pub struct UpdatePermission<'a> {
    pub name: &'a str,
    pub guard_name: &'a str,
    /// Always written, `None` detaches the permission from its group.
    pub permission_group_id: Option<Option<i32>>,
    pub controller: &'a str,
    pub methods: String,
    pub updated_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Permission> for DomainPermission {
    type Error = TypeConstraintError;

    fn try_from(permission: Permission) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PermissionId::try_from(permission.id)?,
            name: PermissionName::new(permission.name)?,
            guard: permission.guard_name.parse()?,
            group_id: permission
                .permission_group_id
                .map(PermissionGroupId::try_from)
                .transpose()?,
            controller: ControllerKey::new(permission.controller)?,
            methods: parse_actions(&permission.methods)?,
            audit: audit_stamp(
                permission.created_by,
                permission.updated_by,
                permission.created_at,
                permission.updated_at,
            ),
        })
    }
}

impl<'a> From<&'a DomainNewPermission> for NewPermission<'a> {
    fn from(permission: &'a DomainNewPermission) -> Self {
        let actor = permission.created_by.map(UserId::get);
        Self {
            name: permission.name.as_str(),
            guard_name: permission.guard.as_str(),
            permission_group_id: permission.group_id.map(PermissionGroupId::get),
            controller: permission.controller.as_str(),
            methods: join_actions(&permission.methods),
            created_by: actor,
            updated_by: actor,
        }
    }
}

impl<'a> From<&'a DomainUpdatePermission> for UpdatePermission<'a> {
    fn from(permission: &'a DomainUpdatePermission) -> Self {
        Self {
            name: permission.name.as_str(),
            guard_name: permission.guard.as_str(),
            permission_group_id: Some(permission.group_id.map(PermissionGroupId::get)),
            controller: permission.controller.as_str(),
            methods: join_actions(&permission.methods),
            updated_by: permission.updated_by.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Guard;

    #[test]
    fn methods_column_is_parsed() {
        let db = Permission {
            id: 1,
            name: "users-list".into(),
            guard_name: "api".into(),
            permission_group_id: Some(2),
            controller: "users".into(),
            methods: "show,index".into(),
            created_by: None,
            updated_by: None,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        };

        let permission = DomainPermission::try_from(db).expect("valid permission");
        assert_eq!(permission.guard, Guard::Api);
        assert_eq!(join_actions(&permission.methods), "index,show");
        assert_eq!(permission.group_id.map(PermissionGroupId::get), Some(2));
    }
}
