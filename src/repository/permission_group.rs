//! Repository implementation for permission groups.

use diesel::prelude::*;

use crate::domain::permission_group::{
    NewPermissionGroup, PermissionGroup, UpdatePermissionGroup,
};
use crate::domain::types::PermissionGroupId;
use crate::models::permission_group::{
    NewPermissionGroup as DbNewPermissionGroup, PermissionGroup as DbPermissionGroup,
    UpdatePermissionGroup as DbUpdatePermissionGroup,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, ListQuery, PermissionGroupReader, PermissionGroupWriter,
};

impl PermissionGroupReader for DieselRepository {
    fn get_permission_group_by_id(
        &self,
        id: PermissionGroupId,
    ) -> RepositoryResult<Option<PermissionGroup>> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;
        let db_group = permission_groups::table
            .filter(permission_groups::id.eq(id.get()))
            .first::<DbPermissionGroup>(&mut conn)
            .optional()?;

        match db_group {
            Some(db_group) => Ok(Some(PermissionGroup::try_from(db_group)?)),
            None => Ok(None),
        }
    }

    fn list_permission_groups(
        &self,
        query: ListQuery,
    ) -> RepositoryResult<(usize, Vec<PermissionGroup>)> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;

        let mut count_query = permission_groups::table.into_boxed();
        let mut items_query = permission_groups::table.into_boxed();
        if let Some(pattern) = query.pattern() {
            count_query = count_query.filter(permission_groups::name.like(pattern.clone()));
            items_query = items_query.filter(permission_groups::name.like(pattern));
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;

        items_query = items_query.order(permission_groups::name.asc());
        if let Some(pagination) = &query.pagination {
            items_query = items_query
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let groups = items_query
            .load::<DbPermissionGroup>(&mut conn)?
            .into_iter()
            .map(|group| PermissionGroup::try_from(group).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total as usize, groups))
    }

    fn list_all_permission_groups(&self) -> RepositoryResult<Vec<PermissionGroup>> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;
        permission_groups::table
            .order(permission_groups::name.asc())
            .load::<DbPermissionGroup>(&mut conn)?
            .into_iter()
            .map(|group| PermissionGroup::try_from(group).map_err(RepositoryError::from))
            .collect()
    }

    fn count_permission_groups(&self) -> RepositoryResult<usize> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;
        let total: i64 = permission_groups::table.count().get_result(&mut conn)?;
        Ok(total as usize)
    }
}

impl PermissionGroupWriter for DieselRepository {
    fn create_permission_group(
        &self,
        new_group: &NewPermissionGroup,
    ) -> RepositoryResult<PermissionGroup> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;
        let db_group = diesel::insert_into(permission_groups::table)
            .values(&DbNewPermissionGroup::from(new_group))
            .get_result::<DbPermissionGroup>(&mut conn)?;

        Ok(PermissionGroup::try_from(db_group)?)
    }

    fn update_permission_group(
        &self,
        id: PermissionGroupId,
        updates: &UpdatePermissionGroup,
    ) -> RepositoryResult<PermissionGroup> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;
        let db_group =
            diesel::update(permission_groups::table.filter(permission_groups::id.eq(id.get())))
                .set(&DbUpdatePermissionGroup::from(updates))
                .get_result::<DbPermissionGroup>(&mut conn)?;

        Ok(PermissionGroup::try_from(db_group)?)
    }

    fn delete_permission_group(&self, id: PermissionGroupId) -> RepositoryResult<()> {
        use crate::schema::permission_groups;

        let mut conn = self.conn()?;
        // Member permissions are detached by `ON DELETE SET NULL`.
        let affected =
            diesel::delete(permission_groups::table.filter(permission_groups::id.eq(id.get())))
                .execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
