use serde::Serialize;

use crate::domain::user::UserDetails;
use crate::dto::SelectOption;

/// Option lists of the user create and edit pages.
#[derive(Debug, Serialize)]
pub struct UserFormOptions {
    pub roles: Vec<SelectOption>,
    pub permissions: Vec<SelectOption>,
}

#[derive(Debug, Serialize)]
pub struct UserEditData {
    pub user: UserDetails,
    pub options: UserFormOptions,
}
