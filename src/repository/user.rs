//! Repository implementation for user accounts.

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::permission::Permission;
use crate::domain::role::Role;
use crate::domain::types::{Email, UserId, UserStatus};
use crate::domain::user::{NewUser, UpdateUser, User, UserAssignments, UserCredentials, UserDetails};
use crate::models::permission::Permission as DbPermission;
use crate::models::role::Role as DbRole;
use crate::models::user::{
    NewUser as DbNewUser, NewUserPermission, NewUserRole, UpdateUser as DbUpdateUser,
    User as DbUser,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ListQuery, UserReader, UserWriter};

/// Replaces the role and direct permission pivots of a user.
fn sync_user_assignments(
    conn: &mut SqliteConnection,
    user_id: i32,
    assignments: &UserAssignments,
) -> QueryResult<()> {
    use crate::schema::{user_permissions, user_roles};

    diesel::delete(user_roles::table.filter(user_roles::user_id.eq(user_id))).execute(conn)?;
    diesel::delete(user_permissions::table.filter(user_permissions::user_id.eq(user_id)))
        .execute(conn)?;

    let roles = assignments
        .role_ids
        .iter()
        .map(|role_id| NewUserRole {
            user_id,
            role_id: role_id.get(),
        })
        .collect::<Vec<_>>();
    if !roles.is_empty() {
        diesel::insert_into(user_roles::table)
            .values(&roles)
            .execute(conn)?;
    }

    let permissions = assignments
        .permission_ids
        .iter()
        .map(|permission_id| NewUserPermission {
            user_id,
            permission_id: permission_id.get(),
        })
        .collect::<Vec<_>>();
    if !permissions.is_empty() {
        diesel::insert_into(user_permissions::table)
            .values(&permissions)
            .execute(conn)?;
    }

    Ok(())
}

fn to_domain_roles(roles: Vec<DbRole>) -> RepositoryResult<Vec<Role>> {
    roles
        .into_iter()
        .map(|role| Role::try_from(role).map_err(RepositoryError::from))
        .collect()
}

fn to_domain_permissions(permissions: Vec<DbPermission>) -> RepositoryResult<Vec<Permission>> {
    permissions
        .into_iter()
        .map(|permission| Permission::try_from(permission).map_err(RepositoryError::from))
        .collect()
}

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_user = users::table
            .filter(users::id.eq(id.get()))
            .filter(users::deleted_at.is_null())
            .first::<DbUser>(&mut conn)
            .optional()?;

        match db_user {
            Some(db_user) => Ok(Some(User::try_from(db_user)?)),
            None => Ok(None),
        }
    }

    fn get_user_credentials(&self, email: &Email) -> RepositoryResult<Option<UserCredentials>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_user = users::table
            .filter(users::email.eq(email.as_str()))
            .filter(users::deleted_at.is_null())
            .first::<DbUser>(&mut conn)
            .optional()?;

        match db_user {
            Some(db_user) => Ok(Some(UserCredentials::try_from(db_user)?)),
            None => Ok(None),
        }
    }

    fn get_user_details(&self, id: UserId) -> RepositoryResult<Option<UserDetails>> {
        use crate::schema::{permissions, user_permissions};

        let Some(user) = self.get_user_by_id(id)? else {
            return Ok(None);
        };
        let roles = self.list_user_roles(id)?;

        let mut conn = self.conn()?;
        let direct = permissions::table
            .inner_join(user_permissions::table)
            .filter(user_permissions::user_id.eq(id.get()))
            .order(permissions::name.asc())
            .select(DbPermission::as_select())
            .load::<DbPermission>(&mut conn)?;

        Ok(Some(UserDetails {
            user,
            roles,
            permissions: to_domain_permissions(direct)?,
        }))
    }

    fn list_users(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<User>)> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let mut count_query = users::table.filter(users::deleted_at.is_null()).into_boxed();
        let mut items_query = users::table.filter(users::deleted_at.is_null()).into_boxed();
        if let Some(pattern) = query.pattern() {
            count_query = count_query.filter(
                users::name
                    .like(pattern.clone())
                    .or(users::email.like(pattern.clone())),
            );
            items_query = items_query.filter(
                users::name
                    .like(pattern.clone())
                    .or(users::email.like(pattern)),
            );
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;

        items_query = items_query.order(users::id.desc());
        if let Some(pagination) = &query.pagination {
            items_query = items_query
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let users = items_query
            .load::<DbUser>(&mut conn)?
            .into_iter()
            .map(|db_user| User::try_from(db_user).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total as usize, users))
    }

    fn list_user_roles(&self, id: UserId) -> RepositoryResult<Vec<Role>> {
        use crate::schema::{roles, user_roles};

        let mut conn = self.conn()?;
        let db_roles = roles::table
            .inner_join(user_roles::table)
            .filter(user_roles::user_id.eq(id.get()))
            .order(roles::name.asc())
            .select(DbRole::as_select())
            .load::<DbRole>(&mut conn)?;

        to_domain_roles(db_roles)
    }

    fn list_user_permissions(&self, id: UserId) -> RepositoryResult<Vec<Permission>> {
        use crate::schema::{permissions, role_permissions, user_permissions, user_roles};

        let mut conn = self.conn()?;

        let direct_ids = user_permissions::table
            .filter(user_permissions::user_id.eq(id.get()))
            .select(user_permissions::permission_id);
        let role_ids = user_roles::table
            .filter(user_roles::user_id.eq(id.get()))
            .select(user_roles::role_id);
        let role_permission_ids = role_permissions::table
            .filter(role_permissions::role_id.eq_any(role_ids))
            .select(role_permissions::permission_id);

        let db_permissions = permissions::table
            .filter(
                permissions::id
                    .eq_any(direct_ids)
                    .or(permissions::id.eq_any(role_permission_ids)),
            )
            .order(permissions::id.asc())
            .load::<DbPermission>(&mut conn)?;

        to_domain_permissions(db_permissions)
    }

    fn count_users(&self) -> RepositoryResult<usize> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let total: i64 = users::table
            .filter(users::deleted_at.is_null())
            .count()
            .get_result(&mut conn)?;
        Ok(total as usize)
    }
}

impl UserWriter for DieselRepository {
    fn create_user(
        &self,
        new_user: &NewUser,
        assignments: &UserAssignments,
    ) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_new_user = DbNewUser::from(new_user);

        let db_user = conn.transaction::<DbUser, diesel::result::Error, _>(|conn| {
            let db_user = diesel::insert_into(users::table)
                .values(&db_new_user)
                .get_result::<DbUser>(conn)?;
            sync_user_assignments(conn, db_user.id, assignments)?;
            Ok(db_user)
        })?;

        Ok(User::try_from(db_user)?)
    }

    fn update_user(
        &self,
        id: UserId,
        updates: &UpdateUser,
        assignments: &UserAssignments,
    ) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateUser::from(updates);

        let db_user = conn.transaction::<DbUser, diesel::result::Error, _>(|conn| {
            let db_user = diesel::update(
                users::table
                    .filter(users::id.eq(id.get()))
                    .filter(users::deleted_at.is_null()),
            )
            .set(&db_updates)
            .get_result::<DbUser>(conn)?;
            sync_user_assignments(conn, db_user.id, assignments)?;
            Ok(db_user)
        })?;

        Ok(User::try_from(db_user)?)
    }

    fn set_user_status(
        &self,
        id: UserId,
        status: UserStatus,
        actor: Option<UserId>,
    ) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_user = diesel::update(
            users::table
                .filter(users::id.eq(id.get()))
                .filter(users::deleted_at.is_null()),
        )
        .set((
            users::status.eq(status.as_str()),
            users::updated_by.eq(actor.map(UserId::get)),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbUser>(&mut conn)?;

        Ok(User::try_from(db_user)?)
    }

    fn delete_user(&self, id: UserId, actor: Option<UserId>) -> RepositoryResult<()> {
        use crate::schema::{employees, users};

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let actor = actor.map(UserId::get);

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            let affected = diesel::update(
                users::table
                    .filter(users::id.eq(id.get()))
                    .filter(users::deleted_at.is_null()),
            )
            .set((
                users::deleted_at.eq(Some(now)),
                users::updated_by.eq(actor),
                users::updated_at.eq(now),
            ))
            .execute(conn)?;
            if affected == 0 {
                return Err(diesel::result::Error::NotFound);
            }

            diesel::update(
                employees::table
                    .filter(employees::user_id.eq(id.get()))
                    .filter(employees::deleted_at.is_null()),
            )
            .set((
                employees::deleted_at.eq(Some(now)),
                employees::updated_by.eq(actor),
                employees::updated_at.eq(now),
            ))
            .execute(conn)?;
            Ok(())
        })?;

        Ok(())
    }
}
