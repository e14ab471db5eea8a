use chrono::Duration;

use crate::dto::dashboard::DashboardStats;
use crate::models::config::CacheConfig;
use crate::repository::{CacheReader, CacheWriter, StatsReader};
use crate::services::ServiceResult;
use crate::services::cache::{DASHBOARD_KEY, QueryCache};

/// Counts records of every admin entity straight from the database.
pub fn compute_dashboard_stats<R>(repo: &R) -> ServiceResult<DashboardStats>
where
    R: StatsReader + ?Sized,
{
    Ok(DashboardStats {
        users: repo.count_users()?,
        roles: repo.count_roles()?,
        permissions: repo.count_permissions()?,
        permission_groups: repo.count_permission_groups()?,
        employees: repo.count_employees()?,
        enquiries: repo.count_enquiries()?,
    })
}

/// Dashboard statistics served through the query cache.
pub fn load_dashboard<R>(repo: &R, config: &CacheConfig) -> ServiceResult<DashboardStats>
where
    R: StatsReader + CacheReader + CacheWriter + ?Sized,
{
    QueryCache::new(repo, Duration::seconds(config.default_ttl_seconds)).remember(
        DASHBOARD_KEY,
        &["dashboard"],
        Some(Duration::seconds(config.dashboard_ttl_seconds)),
        || compute_dashboard_stats(repo),
    )
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;

    fn counting_repo() -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_count_users().returning(|| Ok(4));
        repo.expect_count_roles().returning(|| Ok(2));
        repo.expect_count_permissions().returning(|| Ok(22));
        repo.expect_count_permission_groups().returning(|| Ok(6));
        repo.expect_count_employees().returning(|| Ok(1));
        repo.expect_count_enquiries().returning(|| Ok(9));
        repo
    }

    #[test]
    fn cold_cache_counts_and_stores() {
        let mut repo = counting_repo();
        repo.expect_get_cache_value().returning(|_, _| Ok(None));
        repo.expect_put_cache_value()
            .withf(|key, _, expires_at, tags| {
                key == DASHBOARD_KEY
                    && expires_at.is_some()
                    && tags.contains(&"dashboard".to_string())
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let stats = load_dashboard(&repo, &CacheConfig::default()).unwrap();

        assert_eq!(stats.users, 4);
        assert_eq!(stats.enquiries, 9);
    }

    #[test]
    fn warm_cache_skips_counting() {
        let cached = DashboardStats {
            users: 1,
            ..DashboardStats::default()
        };
        let raw = serde_json::to_string(&cached).unwrap();
        let mut repo = MockRepository::new();
        repo.expect_get_cache_value()
            .returning(move |_, _| Ok(Some(raw.clone())));
        repo.expect_count_users().times(0);

        let stats = load_dashboard(&repo, &CacheConfig::default()).unwrap();

        assert_eq!(stats, cached);
    }
}
