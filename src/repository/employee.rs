//! Repository implementation for employees and their user accounts.

use chrono::Utc;
use diesel::prelude::*;

use crate::domain::employee::{Employee, EmployeeWithUser, NewEmployee, UpdateEmployee};
use crate::domain::types::{EmployeeId, UserId};
use crate::domain::user::User;
use crate::models::employee::{
    Employee as DbEmployee, NewEmployee as DbNewEmployee, UpdateEmployee as DbUpdateEmployee,
};
use crate::models::user::{NewUser as DbNewUser, UpdateUser as DbUpdateUser, User as DbUser};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, EmployeeReader, EmployeeWriter, ListQuery};

fn to_domain(employee: DbEmployee, user: DbUser) -> RepositoryResult<EmployeeWithUser> {
    Ok(EmployeeWithUser {
        employee: Employee::try_from(employee)?,
        user: User::try_from(user)?,
    })
}

impl EmployeeReader for DieselRepository {
    fn get_employee_by_id(&self, id: EmployeeId) -> RepositoryResult<Option<EmployeeWithUser>> {
        use crate::schema::{employees, users};

        let mut conn = self.conn()?;
        let row = employees::table
            .inner_join(users::table)
            .filter(employees::id.eq(id.get()))
            .filter(employees::deleted_at.is_null())
            .select((DbEmployee::as_select(), DbUser::as_select()))
            .first::<(DbEmployee, DbUser)>(&mut conn)
            .optional()?;

        match row {
            Some((employee, user)) => Ok(Some(to_domain(employee, user)?)),
            None => Ok(None),
        }
    }

    fn list_employees(
        &self,
        query: ListQuery,
    ) -> RepositoryResult<(usize, Vec<EmployeeWithUser>)> {
        use crate::schema::{employees, users};

        let mut conn = self.conn()?;

        let mut count_query = employees::table
            .inner_join(users::table)
            .filter(employees::deleted_at.is_null())
            .into_boxed();
        let mut items_query = employees::table
            .inner_join(users::table)
            .filter(employees::deleted_at.is_null())
            .into_boxed();
        if let Some(pattern) = query.pattern() {
            count_query = count_query.filter(
                users::name
                    .like(pattern.clone())
                    .or(users::email.like(pattern.clone()))
                    .or(employees::employee_code.like(pattern.clone())),
            );
            items_query = items_query.filter(
                users::name
                    .like(pattern.clone())
                    .or(users::email.like(pattern.clone()))
                    .or(employees::employee_code.like(pattern)),
            );
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;

        items_query = items_query.order(employees::id.desc());
        if let Some(pagination) = &query.pagination {
            items_query = items_query
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let employees = items_query
            .select((DbEmployee::as_select(), DbUser::as_select()))
            .load::<(DbEmployee, DbUser)>(&mut conn)?
            .into_iter()
            .map(|(employee, user)| to_domain(employee, user))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total as usize, employees))
    }

    fn count_employees(&self) -> RepositoryResult<usize> {
        use crate::schema::employees;

        let mut conn = self.conn()?;
        let total: i64 = employees::table
            .filter(employees::deleted_at.is_null())
            .count()
            .get_result(&mut conn)?;
        Ok(total as usize)
    }
}

impl EmployeeWriter for DieselRepository {
    fn create_employee(&self, new_employee: &NewEmployee) -> RepositoryResult<EmployeeWithUser> {
        use crate::schema::{employees, users};

        let mut conn = self.conn()?;
        let db_new_user = DbNewUser::from(&new_employee.user);

        let (employee, user) =
            conn.transaction::<(DbEmployee, DbUser), diesel::result::Error, _>(|conn| {
                let user = diesel::insert_into(users::table)
                    .values(&db_new_user)
                    .get_result::<DbUser>(conn)?;
                let employee = diesel::insert_into(employees::table)
                    .values(&DbNewEmployee::new(
                        user.id,
                        &new_employee.profile,
                        new_employee.created_by,
                    ))
                    .get_result::<DbEmployee>(conn)?;
                Ok((employee, user))
            })?;

        to_domain(employee, user)
    }

    fn update_employee(
        &self,
        id: EmployeeId,
        updates: &UpdateEmployee,
    ) -> RepositoryResult<EmployeeWithUser> {
        use crate::schema::{employees, users};

        let mut conn = self.conn()?;
        let db_user_updates = DbUpdateUser::from(&updates.user);
        let db_employee_updates = DbUpdateEmployee::new(&updates.profile, updates.updated_by);

        let (employee, user) =
            conn.transaction::<(DbEmployee, DbUser), diesel::result::Error, _>(|conn| {
                let employee = diesel::update(
                    employees::table
                        .filter(employees::id.eq(id.get()))
                        .filter(employees::deleted_at.is_null()),
                )
                .set(&db_employee_updates)
                .get_result::<DbEmployee>(conn)?;
                let user = diesel::update(users::table.filter(users::id.eq(employee.user_id)))
                    .set(&db_user_updates)
                    .get_result::<DbUser>(conn)?;
                Ok((employee, user))
            })?;

        to_domain(employee, user)
    }

    fn delete_employee(&self, id: EmployeeId, actor: Option<UserId>) -> RepositoryResult<()> {
        use crate::schema::{employees, users};

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let actor = actor.map(UserId::get);

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            let user_id = employees::table
                .filter(employees::id.eq(id.get()))
                .filter(employees::deleted_at.is_null())
                .select(employees::user_id)
                .first::<i32>(conn)?;

            diesel::update(employees::table.filter(employees::id.eq(id.get())))
                .set((
                    employees::deleted_at.eq(Some(now)),
                    employees::updated_by.eq(actor),
                    employees::updated_at.eq(now),
                ))
                .execute(conn)?;
            diesel::update(users::table.filter(users::id.eq(user_id)))
                .set((
                    users::deleted_at.eq(Some(now)),
                    users::updated_by.eq(actor),
                    users::updated_at.eq(now),
                ))
                .execute(conn)?;
            Ok(())
        })
        .map_err(RepositoryError::from)
    }
}
