use serde::{Deserialize, Serialize};

/// Record counts shown on the dashboard; cached as JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub users: usize,
    pub roles: usize,
    pub permissions: usize,
    pub permission_groups: usize,
    pub employees: usize,
    pub enquiries: usize,
}
