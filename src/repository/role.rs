//! Repository implementation for roles and their permissions.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::permission::Permission;
use crate::domain::role::{NewRole, Role, RoleDetails, UpdateRole};
use crate::domain::types::{Guard, PermissionId, RoleId};
use crate::models::permission::Permission as DbPermission;
use crate::models::role::{
    NewRole as DbNewRole, NewRolePermission, Role as DbRole, UpdateRole as DbUpdateRole,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ListQuery, RoleReader, RoleWriter};

fn sync_role_permissions(
    conn: &mut SqliteConnection,
    role_id: i32,
    permission_ids: &[PermissionId],
) -> QueryResult<()> {
    use crate::schema::role_permissions;

    diesel::delete(role_permissions::table.filter(role_permissions::role_id.eq(role_id)))
        .execute(conn)?;

    let rows = permission_ids
        .iter()
        .map(|permission_id| NewRolePermission {
            role_id,
            permission_id: permission_id.get(),
        })
        .collect::<Vec<_>>();
    if !rows.is_empty() {
        diesel::insert_into(role_permissions::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

impl RoleReader for DieselRepository {
    fn get_role_by_id(&self, id: RoleId) -> RepositoryResult<Option<Role>> {
        use crate::schema::roles;

        let mut conn = self.conn()?;
        let db_role = roles::table
            .filter(roles::id.eq(id.get()))
            .first::<DbRole>(&mut conn)
            .optional()?;

        match db_role {
            Some(db_role) => Ok(Some(Role::try_from(db_role)?)),
            None => Ok(None),
        }
    }

    fn get_role_details(&self, id: RoleId) -> RepositoryResult<Option<RoleDetails>> {
        use crate::schema::{permissions, role_permissions};

        let Some(role) = self.get_role_by_id(id)? else {
            return Ok(None);
        };

        let mut conn = self.conn()?;
        let permissions = permissions::table
            .inner_join(role_permissions::table)
            .filter(role_permissions::role_id.eq(id.get()))
            .order(permissions::name.asc())
            .select(DbPermission::as_select())
            .load::<DbPermission>(&mut conn)?
            .into_iter()
            .map(|permission| Permission::try_from(permission).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Some(RoleDetails { role, permissions }))
    }

    fn list_roles(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Role>)> {
        use crate::schema::roles;

        let mut conn = self.conn()?;

        let mut count_query = roles::table.into_boxed();
        let mut items_query = roles::table.into_boxed();
        if let Some(pattern) = query.pattern() {
            count_query = count_query.filter(roles::name.like(pattern.clone()));
            items_query = items_query.filter(roles::name.like(pattern));
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;

        items_query = items_query.order((roles::name.asc(), roles::guard_name.asc()));
        if let Some(pagination) = &query.pagination {
            items_query = items_query
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let roles = items_query
            .load::<DbRole>(&mut conn)?
            .into_iter()
            .map(|role| Role::try_from(role).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total as usize, roles))
    }

    fn list_all_roles(&self, guard: Option<Guard>) -> RepositoryResult<Vec<Role>> {
        use crate::schema::roles;

        let mut conn = self.conn()?;
        let mut query = roles::table.order(roles::name.asc()).into_boxed();
        if let Some(guard) = guard {
            query = query.filter(roles::guard_name.eq(guard.as_str()));
        }

        query
            .load::<DbRole>(&mut conn)?
            .into_iter()
            .map(|role| Role::try_from(role).map_err(RepositoryError::from))
            .collect()
    }

    fn count_roles(&self) -> RepositoryResult<usize> {
        use crate::schema::roles;

        let mut conn = self.conn()?;
        let total: i64 = roles::table.count().get_result(&mut conn)?;
        Ok(total as usize)
    }
}

impl RoleWriter for DieselRepository {
    fn create_role(
        &self,
        new_role: &NewRole,
        permission_ids: &[PermissionId],
    ) -> RepositoryResult<Role> {
        use crate::schema::roles;

        let mut conn = self.conn()?;
        let db_new_role = DbNewRole::from(new_role);

        let db_role = conn.transaction::<DbRole, diesel::result::Error, _>(|conn| {
            let db_role = diesel::insert_into(roles::table)
                .values(&db_new_role)
                .get_result::<DbRole>(conn)?;
            sync_role_permissions(conn, db_role.id, permission_ids)?;
            Ok(db_role)
        })?;

        Ok(Role::try_from(db_role)?)
    }

    fn update_role(
        &self,
        id: RoleId,
        updates: &UpdateRole,
        permission_ids: &[PermissionId],
    ) -> RepositoryResult<Role> {
        use crate::schema::roles;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateRole::from(updates);

        let db_role = conn.transaction::<DbRole, diesel::result::Error, _>(|conn| {
            let db_role = diesel::update(roles::table.filter(roles::id.eq(id.get())))
                .set(&db_updates)
                .get_result::<DbRole>(conn)?;
            sync_role_permissions(conn, db_role.id, permission_ids)?;
            Ok(db_role)
        })?;

        Ok(Role::try_from(db_role)?)
    }

    fn delete_role(&self, id: RoleId) -> RepositoryResult<()> {
        use crate::schema::roles;

        let mut conn = self.conn()?;
        let affected =
            diesel::delete(roles::table.filter(roles::id.eq(id.get()))).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
