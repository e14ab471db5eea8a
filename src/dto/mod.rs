//! DTO modules that bridge services with page props and API responses.

use serde::Serialize;

use crate::pagination::Paginated;

pub mod dashboard;
pub mod permissions;
pub mod roles;
pub mod users;

/// Props of every index page.
#[derive(Debug, Serialize)]
pub struct IndexPageData<T> {
    pub records: Paginated<T>,
    pub filters: IndexFilters,
}

#[derive(Debug, Default, Serialize)]
pub struct IndexFilters {
    pub search: String,
}

/// Entry of a `<select>` list.
#[derive(Clone, Debug, Serialize, serde::Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: i32,
    pub label: String,
}
