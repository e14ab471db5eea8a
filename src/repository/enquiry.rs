use chrono::Utc;
use diesel::prelude::*;

use crate::domain::enquiry::{Enquiry, NewEnquiry, UpdateEnquiryRemark};
use crate::domain::types::{EnquiryId, UserId};
use crate::models::enquiry::{
    Enquiry as DbEnquiry, NewEnquiry as DbNewEnquiry,
    UpdateEnquiryRemark as DbUpdateEnquiryRemark,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, EnquiryReader, EnquiryWriter, ListQuery};

impl EnquiryReader for DieselRepository {
    fn get_enquiry_by_id(&self, id: EnquiryId) -> RepositoryResult<Option<Enquiry>> {
        use crate::schema::enquiries;

        let mut conn = self.conn()?;
        let db_enquiry = enquiries::table
            .filter(enquiries::id.eq(id.get()))
            .filter(enquiries::deleted_at.is_null())
            .first::<DbEnquiry>(&mut conn)
            .optional()?;

        match db_enquiry {
            Some(db_enquiry) => Ok(Some(Enquiry::try_from(db_enquiry)?)),
            None => Ok(None),
        }
    }

    fn list_enquiries(&self, query: ListQuery) -> RepositoryResult<(usize, Vec<Enquiry>)> {
        use crate::schema::enquiries;

        let mut conn = self.conn()?;

        let mut count_query = enquiries::table
            .filter(enquiries::deleted_at.is_null())
            .into_boxed();
        let mut items_query = enquiries::table
            .filter(enquiries::deleted_at.is_null())
            .into_boxed();
        if let Some(pattern) = query.pattern() {
            count_query = count_query.filter(
                enquiries::name
                    .like(pattern.clone())
                    .or(enquiries::email.like(pattern.clone()))
                    .or(enquiries::subject.like(pattern.clone())),
            );
            items_query = items_query.filter(
                enquiries::name
                    .like(pattern.clone())
                    .or(enquiries::email.like(pattern.clone()))
                    .or(enquiries::subject.like(pattern)),
            );
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;

        items_query = items_query.order(enquiries::id.desc());
        if let Some(pagination) = &query.pagination {
            items_query = items_query
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let enquiries = items_query
            .load::<DbEnquiry>(&mut conn)?
            .into_iter()
            .map(|enquiry| Enquiry::try_from(enquiry).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total as usize, enquiries))
    }

    fn count_enquiries(&self) -> RepositoryResult<usize> {
        use crate::schema::enquiries;

        let mut conn = self.conn()?;
        let total: i64 = enquiries::table
            .filter(enquiries::deleted_at.is_null())
            .count()
            .get_result(&mut conn)?;
        Ok(total as usize)
    }
}

impl EnquiryWriter for DieselRepository {
    fn create_enquiry(&self, new_enquiry: &NewEnquiry) -> RepositoryResult<Enquiry> {
        use crate::schema::enquiries;

        let mut conn = self.conn()?;
        let db_enquiry = diesel::insert_into(enquiries::table)
            .values(&DbNewEnquiry::from(new_enquiry))
            .get_result::<DbEnquiry>(&mut conn)?;

        Ok(Enquiry::try_from(db_enquiry)?)
    }

    fn update_enquiry_remark(
        &self,
        id: EnquiryId,
        updates: &UpdateEnquiryRemark,
    ) -> RepositoryResult<Enquiry> {
        use crate::schema::enquiries;

        let mut conn = self.conn()?;
        let db_enquiry = diesel::update(
            enquiries::table
                .filter(enquiries::id.eq(id.get()))
                .filter(enquiries::deleted_at.is_null()),
        )
        .set(&DbUpdateEnquiryRemark::from(updates))
        .get_result::<DbEnquiry>(&mut conn)?;

        Ok(Enquiry::try_from(db_enquiry)?)
    }

    fn delete_enquiry(&self, id: EnquiryId, actor: Option<UserId>) -> RepositoryResult<()> {
        use crate::schema::enquiries;

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let affected = diesel::update(
            enquiries::table
                .filter(enquiries::id.eq(id.get()))
                .filter(enquiries::deleted_at.is_null()),
        )
        .set((
            enquiries::deleted_at.eq(Some(now)),
            enquiries::updated_by.eq(actor.map(UserId::get)),
            enquiries::updated_at.eq(now),
        ))
        .execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
