//! Diesel models for permission groups.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::permission_group::{
    NewPermissionGroup as DomainNewPermissionGroup, PermissionGroup as DomainPermissionGroup,
    UpdatePermissionGroup as DomainUpdatePermissionGroup,
};
use crate::domain::types::{
    ControllerKey, PermissionGroupId, PermissionGroupName, TypeConstraintError, UserId,
};
use crate::models::audit_stamp;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::permission_groups)]
pub struct PermissionGroup {
    pub id: i32,
    pub name: String,
    pub controller: Option<String>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::permission_groups)]
pub struct NewPermissionGroup<'a> {
    pub name: &'a str,
    pub controller: Option<&'a str>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::permission_groups)]
#[diesel(treat_none_as_null = true)]
pub struct UpdatePermissionGroup<'a> {
    pub name: &'a str,
    pub controller: Option<&'a str>,
    pub updated_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<PermissionGroup> for DomainPermissionGroup {
    type Error = TypeConstraintError;

    fn try_from(group: PermissionGroup) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PermissionGroupId::try_from(group.id)?,
            name: PermissionGroupName::new(group.name)?,
            controller: group.controller.map(ControllerKey::new).transpose()?,
            audit: audit_stamp(
                group.created_by,
                group.updated_by,
                group.created_at,
                group.updated_at,
            ),
        })
    }
}

impl<'a> From<&'a DomainNewPermissionGroup> for NewPermissionGroup<'a> {
    fn from(group: &'a DomainNewPermissionGroup) -> Self {
        let actor = group.created_by.map(UserId::get);
        Self {
            name: group.name.as_str(),
            controller: group.controller.as_ref().map(ControllerKey::as_str),
            created_by: actor,
            updated_by: actor,
        }
    }
}

impl<'a> From<&'a DomainUpdatePermissionGroup> for UpdatePermissionGroup<'a> {
    fn from(group: &'a DomainUpdatePermissionGroup) -> Self {
        Self {
            name: group.name.as_str(),
            controller: group.controller.as_ref().map(ControllerKey::as_str),
            updated_by: group.updated_by.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}
