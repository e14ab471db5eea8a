//! Diesel models representing users and their role/permission pivots.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::types::{Email, PersonName, TypeConstraintError, UserId};
use crate::domain::user::{
    NewUser as DomainNewUser, UpdateUser as DomainUpdateUser, User as DomainUser,
    UserCredentials,
};
use crate::models::audit_stamp;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
/// Diesel model for [`crate::domain::user::User`].
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
/// Insertable form of [`User`].
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub status: &'a str,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
/// Data used when updating a [`User`] record. A `None` password keeps the stored hash.
pub struct UpdateUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: Option<&'a str>,
    pub status: &'a str,
    pub updated_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::user_roles)]
pub struct NewUserRole {
    pub user_id: i32,
    pub role_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::user_permissions)]
pub struct NewUserPermission {
    pub user_id: i32,
    pub permission_id: i32,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::try_from(user.id)?,
            name: PersonName::new(user.name)?,
            email: Email::new(user.email)?,
            status: user.status.parse()?,
            audit: audit_stamp(
                user.created_by,
                user.updated_by,
                user.created_at,
                user.updated_at,
            ),
        })
    }
}

impl TryFrom<User> for UserCredentials {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        let password_hash = user.password.clone();
        Ok(Self {
            user: DomainUser::try_from(user)?,
            password_hash,
        })
    }
}

impl<'a> From<&'a DomainNewUser> for NewUser<'a> {
    fn from(user: &'a DomainNewUser) -> Self {
        let actor = user.created_by.map(UserId::get);
        Self {
            name: user.name.as_str(),
            email: user.email.as_str(),
            password: user.password_hash.as_str(),
            status: user.status.as_str(),
            created_by: actor,
            updated_by: actor,
        }
    }
}

impl<'a> From<&'a DomainUpdateUser> for UpdateUser<'a> {
    fn from(user: &'a DomainUpdateUser) -> Self {
        Self {
            name: user.name.as_str(),
            email: user.email.as_str(),
            password: user.password_hash.as_deref(),
            status: user.status.as_str(),
            updated_by: user.updated_by.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}
