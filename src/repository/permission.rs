//! Repository implementation for permissions.

use diesel::prelude::*;

use crate::domain::permission::{NewPermission, Permission, UpdatePermission};
use crate::domain::types::{Guard, PermissionId};
use crate::models::permission::{
    NewPermission as DbNewPermission, Permission as DbPermission,
    UpdatePermission as DbUpdatePermission,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ListQuery, PermissionReader, PermissionWriter};

impl PermissionReader for DieselRepository {
    fn get_permission_by_id(&self, id: PermissionId) -> RepositoryResult<Option<Permission>> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;
        let db_permission = permissions::table
            .filter(permissions::id.eq(id.get()))
            .first::<DbPermission>(&mut conn)
            .optional()?;

        match db_permission {
            Some(db_permission) => Ok(Some(Permission::try_from(db_permission)?)),
            None => Ok(None),
        }
    }

    fn list_permissions(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Permission>)> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;

        let mut count_query = permissions::table.into_boxed();
        let mut items_query = permissions::table.into_boxed();
        if let Some(pattern) = query.pattern() {
            count_query = count_query.filter(
                permissions::name
                    .like(pattern.clone())
                    .or(permissions::controller.like(pattern.clone())),
            );
            items_query = items_query.filter(
                permissions::name
                    .like(pattern.clone())
                    .or(permissions::controller.like(pattern)),
            );
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;

        items_query = items_query.order((permissions::controller.asc(), permissions::name.asc()));
        if let Some(pagination) = &query.pagination {
            items_query = items_query
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let permissions = items_query
            .load::<DbPermission>(&mut conn)?
            .into_iter()
            .map(|permission| Permission::try_from(permission).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total as usize, permissions))
    }

    fn list_all_permissions(&self, guard: Option<Guard>) -> RepositoryResult<Vec<Permission>> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;
        let mut query = permissions::table
            .order((permissions::controller.asc(), permissions::name.asc()))
            .into_boxed();
        if let Some(guard) = guard {
            query = query.filter(permissions::guard_name.eq(guard.as_str()));
        }

        query
            .load::<DbPermission>(&mut conn)?
            .into_iter()
            .map(|permission| Permission::try_from(permission).map_err(RepositoryError::from))
            .collect()
    }

    fn count_permissions(&self) -> RepositoryResult<usize> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;
        let total: i64 = permissions::table.count().get_result(&mut conn)?;
        Ok(total as usize)
    }
}

impl PermissionWriter for DieselRepository {
    fn create_permission(&self, new_permission: &NewPermission) -> RepositoryResult<Permission> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;
        let db_permission = diesel::insert_into(permissions::table)
            .values(&DbNewPermission::from(new_permission))
            .get_result::<DbPermission>(&mut conn)?;

        Ok(Permission::try_from(db_permission)?)
    }

    fn update_permission(
        &self,
        id: PermissionId,
        updates: &UpdatePermission,
    ) -> RepositoryResult<Permission> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;
        let db_permission = diesel::update(permissions::table.filter(permissions::id.eq(id.get())))
            .set(&DbUpdatePermission::from(updates))
            .get_result::<DbPermission>(&mut conn)?;

        Ok(Permission::try_from(db_permission)?)
    }

    fn delete_permission(&self, id: PermissionId) -> RepositoryResult<()> {
        use crate::schema::permissions;

        let mut conn = self.conn()?;
        let affected = diesel::delete(permissions::table.filter(permissions::id.eq(id.get())))
            .execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
