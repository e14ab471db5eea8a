//! Services for contact enquiries: the public submission and the admin
//! screens that annotate, export and remove them.

use validator::Validate;

use crate::domain::enquiry::{Enquiry, NewEnquiry, UpdateEnquiryRemark};
use crate::domain::types::{EnquiryId, optional_text};
use crate::dto::{IndexFilters, IndexPageData};
use crate::forms::enquiries::{EnquiryForm, EnquiryRemarkForm};
use crate::forms::{FormError, IndexParams};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{CacheWriter, EnquiryReader, EnquiryWriter, ListQuery};
use crate::services::cache::invalidate;
use crate::services::{PER_PAGE, ServiceError, ServiceResult};

const TAGS: &[&str] = &["enquiries", "dashboard"];

pub fn list_enquiries<R>(repo: &R, params: &IndexParams) -> ServiceResult<IndexPageData<Enquiry>>
where
    R: EnquiryReader + ?Sized,
{
    let page = params.page();
    let (total, enquiries) = repo.list_enquiries(
        ListQuery::new()
            .search(params.search())
            .paginate(page, PER_PAGE),
    )?;

    Ok(IndexPageData {
        records: Paginated::new(enquiries, page, total, PER_PAGE),
        filters: IndexFilters {
            search: params.search().to_string(),
        },
    })
}

pub fn show_enquiry<R>(repo: &R, id: i32) -> ServiceResult<Enquiry>
where
    R: EnquiryReader + ?Sized,
{
    let id = EnquiryId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_enquiry_by_id(id)?.ok_or(ServiceError::NotFound)
}

/// Stores a submission from the public contact form.
pub fn submit_enquiry<R>(repo: &R, form: EnquiryForm) -> ServiceResult<Enquiry>
where
    R: EnquiryWriter + CacheWriter + ?Sized,
{
    let new_enquiry = NewEnquiry::try_from(form)?;
    let enquiry = repo.create_enquiry(&new_enquiry)?;
    invalidate(repo, TAGS);

    log::info!("Enquiry {} received from {}", enquiry.id, enquiry.email);
    Ok(enquiry)
}

pub fn update_remark<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: EnquiryRemarkForm,
) -> ServiceResult<Enquiry>
where
    R: EnquiryWriter + CacheWriter + ?Sized,
{
    let id = EnquiryId::new(id).map_err(|_| ServiceError::NotFound)?;
    form.validate().map_err(FormError::from)?;

    let enquiry = repo.update_enquiry_remark(
        id,
        &UpdateEnquiryRemark {
            remark: optional_text(form.remark),
            updated_by: user.user_id().ok(),
        },
    )?;
    invalidate(repo, TAGS);
    Ok(enquiry)
}

pub fn delete_enquiry<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: EnquiryWriter + CacheWriter + ?Sized,
{
    let id = EnquiryId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.delete_enquiry(id, user.user_id().ok())?;
    invalidate(repo, TAGS);
    log::info!("Enquiry {} deleted by {}", id, user.sub);
    Ok(())
}

/// Renders every enquiry matching `search` as CSV.
/// Prefixes cells a spreadsheet would evaluate as a formula with `'`.
fn spreadsheet_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

pub fn export_enquiries<R>(repo: &R, search: &str) -> ServiceResult<Vec<u8>>
where
    R: EnquiryReader + ?Sized,
{
    let (_, enquiries) = repo.list_enquiries(ListQuery::new().search(search))?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_error = |err: csv::Error| ServiceError::Internal(format!("CSV export failed: {err}"));

    writer
        .write_record([
            "id",
            "name",
            "email",
            "phone",
            "subject",
            "message",
            "remark",
            "created_at",
        ])
        .map_err(csv_error)?;
    for enquiry in &enquiries {
        writer
            .write_record([
                enquiry.id.to_string(),
                spreadsheet_cell(enquiry.name.as_str()),
                spreadsheet_cell(enquiry.email.as_str()),
                enquiry
                    .phone
                    .as_ref()
                    .map(|phone| phone.as_str().to_string())
                    .unwrap_or_default(),
                spreadsheet_cell(enquiry.subject.as_deref().unwrap_or_default()),
                spreadsheet_cell(enquiry.message.as_str()),
                spreadsheet_cell(enquiry.remark.as_deref().unwrap_or_default()),
                enquiry
                    .audit
                    .created_at
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(format!("CSV export failed: {err}")))
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::AuditStamp;
    use crate::domain::types::{Email, PersonName, SanitizedText};
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn stored(remark: Option<&str>) -> Enquiry {
        Enquiry {
            id: EnquiryId::new(4).unwrap(),
            name: PersonName::new("Visitor").unwrap(),
            email: Email::new("visitor@example.com").unwrap(),
            phone: None,
            subject: Some("Pricing, plans".into()),
            message: SanitizedText::new("Hello").unwrap(),
            remark: remark.map(str::to_string),
            audit: AuditStamp::default(),
        }
    }

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".into(),
            email: "admin@example.com".into(),
            name: "Admin".into(),
            roles: vec![],
            exp: 0,
        }
    }

    #[test]
    fn submission_is_stored_and_dashboard_flushed() {
        let mut repo = MockRepository::new();
        repo.expect_create_enquiry()
            .withf(|new| new.email.as_str() == "visitor@example.com")
            .times(1)
            .returning(|_| Ok(stored(None)));
        repo.expect_flush_cache_tags()
            .withf(|tags| tags.iter().any(|tag| tag == "dashboard"))
            .times(1)
            .returning(|_| Ok(1));

        submit_enquiry(
            &repo,
            EnquiryForm {
                name: "Visitor".into(),
                email: "Visitor@Example.com".into(),
                phone: None,
                subject: None,
                message: "Hello".into(),
            },
        )
        .unwrap();
    }

    #[test]
    fn blank_remark_is_cleared() {
        let mut repo = MockRepository::new();
        repo.expect_update_enquiry_remark()
            .withf(|_, updates| updates.remark.is_none())
            .times(1)
            .returning(|_, _| Ok(stored(None)));
        repo.expect_flush_cache_tags().returning(|_| Ok(0));

        update_remark(
            &repo,
            &admin(),
            4,
            EnquiryRemarkForm {
                remark: Some("   ".into()),
            },
        )
        .unwrap();
    }

    #[test]
    fn deleting_missing_enquiry_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_delete_enquiry()
            .returning(|_, _| Err(RepositoryError::NotFound));

        assert!(matches!(
            delete_enquiry(&repo, &admin(), 4),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn export_quotes_fields() {
        let mut repo = MockRepository::new();
        repo.expect_list_enquiries()
            .withf(|query| query.pagination.is_none())
            .returning(|_| Ok((1, vec![stored(Some("called back"))])));

        let csv = String::from_utf8(export_enquiries(&repo, "").unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("id,name,email,phone,subject,message,remark,created_at")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(
            "4,Visitor,visitor@example.com,,\"Pricing, plans\",Hello,called back,"
        ));
    }

    #[test]
    fn export_neutralises_formula_cells() {
        let mut repo = MockRepository::new();
        repo.expect_list_enquiries().returning(|_| {
            let mut enquiry = stored(Some("-1+1"));
            enquiry.name = PersonName::new("=HYPERLINK(\"http://evil.example\",\"x\")").unwrap();
            enquiry.subject = Some("@SUM(1+1)".into());
            enquiry.message = SanitizedText::new("+cmd").unwrap();
            Ok((1, vec![enquiry]))
        });

        let csv = String::from_utf8(export_enquiries(&repo, "").unwrap()).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let row = reader.records().next().unwrap().unwrap();

        assert_eq!(&row[1], "'=HYPERLINK(\"http://evil.example\",\"x\")");
        assert_eq!(&row[4], "'@SUM(1+1)");
        assert_eq!(&row[5], "'+cmd");
        assert_eq!(&row[6], "'-1+1");
    }

    #[test]
    fn plain_cells_are_left_alone() {
        assert_eq!(spreadsheet_cell("Hello"), "Hello");
        assert_eq!(spreadsheet_cell(""), "");
        assert_eq!(spreadsheet_cell("\tx"), "'\tx");
    }
}
