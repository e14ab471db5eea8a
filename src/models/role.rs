//! Diesel models for roles and the role/permission pivot.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::role::{
    NewRole as DomainNewRole, Role as DomainRole, UpdateRole as DomainUpdateRole,
};
use crate::domain::types::{RoleId, RoleName, TypeConstraintError, UserId};
use crate::models::audit_stamp;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::roles)]
/// Diesel model for [`crate::domain::role::Role`].
pub struct Role {
    pub id: i32,
    pub name: String,
    pub guard_name: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::roles)]
pub struct NewRole<'a> {
    pub name: &'a str,
    pub guard_name: &'a str,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::roles)]
pub struct UpdateRole<'a> {
    pub name: &'a str,
    pub guard_name: &'a str,
    pub updated_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::role_permissions)]
pub struct NewRolePermission {
    pub role_id: i32,
    pub permission_id: i32,
}

impl TryFrom<Role> for DomainRole {
    type Error = TypeConstraintError;

    fn try_from(role: Role) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RoleId::try_from(role.id)?,
            name: RoleName::new(role.name)?,
            guard: role.guard_name.parse()?,
            audit: audit_stamp(
                role.created_by,
                role.updated_by,
                role.created_at,
                role.updated_at,
            ),
        })
    }
}

impl<'a> From<&'a DomainNewRole> for NewRole<'a> {
    fn from(role: &'a DomainNewRole) -> Self {
        let actor = role.created_by.map(UserId::get);
        Self {
            name: role.name.as_str(),
            guard_name: role.guard.as_str(),
            created_by: actor,
            updated_by: actor,
        }
    }
}

impl<'a> From<&'a DomainUpdateRole> for UpdateRole<'a> {
    fn from(role: &'a DomainUpdateRole) -> Self {
        Self {
            name: role.name.as_str(),
            guard_name: role.guard.as_str(),
            updated_by: role.updated_by.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}
