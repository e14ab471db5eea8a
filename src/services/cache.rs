//! Keyed query cache with TTL and tags, and the console cache operations.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tera::Tera;

use crate::dto::SelectOption;
use crate::models::config::{ServerConfig, load_server_config};
use crate::repository::{CacheReader, CacheStats, CacheWriter, RoleReader, StatsReader};
use crate::services::dashboard::compute_dashboard_stats;
use crate::services::{ServiceError, ServiceResult};

/// Tag attached to every entry written through [`QueryCache`].
pub const QUERIES_TAG: &str = "queries";
pub const DASHBOARD_KEY: &str = "dashboard.stats";
pub const ROLE_OPTIONS_KEY: &str = "options.roles";
pub const PERMISSION_GROUPS_KEY: &str = "options.permission-groups";

/// Read-through cache over the cache store.
pub struct QueryCache<'a, R: ?Sized> {
    repo: &'a R,
    default_ttl: Duration,
}

impl<'a, R> QueryCache<'a, R>
where
    R: CacheReader + CacheWriter + ?Sized,
{
    pub fn new(repo: &'a R, default_ttl: Duration) -> Self {
        Self { repo, default_ttl }
    }

    /// Returns the cached value or computes and stores it.
    ///
    /// Entries that no longer decode into `T` are treated as misses.
    pub fn remember<T, F>(
        &self,
        key: &str,
        tags: &[&str],
        ttl: Option<Duration>,
        compute: F,
    ) -> ServiceResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> ServiceResult<T>,
    {
        if let Some(value) = self.get::<T>(key)? {
            return Ok(value);
        }
        let value = compute()?;
        self.put(key, &value, tags, ttl)?;
        Ok(value)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> ServiceResult<Option<T>> {
        let Some(raw) = self.repo.get_cache_value(key, Utc::now().naive_utc())? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                log::warn!("Discarding undecodable cache entry `{key}`: {err}");
                Ok(None)
            }
        }
    }

    /// Stores `value` for `ttl` (the default TTL when `None`). A zero TTL
    /// stores the entry without expiry.
    pub fn put<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        tags: &[&str],
        ttl: Option<Duration>,
    ) -> ServiceResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| ServiceError::Internal(format!("Failed to encode cache value: {e}")))?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = (ttl > Duration::zero()).then(|| Utc::now().naive_utc() + ttl);

        let mut all_tags = tags.iter().map(|tag| tag.to_string()).collect::<Vec<_>>();
        all_tags.push(QUERIES_TAG.to_string());
        all_tags.sort();
        all_tags.dedup();

        self.repo.put_cache_value(key, &raw, expires_at, &all_tags)?;
        Ok(())
    }

    pub fn forget(&self, key: &str) -> ServiceResult<bool> {
        Ok(self.repo.forget_cache_value(key)?)
    }

    pub fn flush_tags(&self, tags: &[&str]) -> ServiceResult<usize> {
        let tags = tags.iter().map(|tag| tag.to_string()).collect::<Vec<_>>();
        Ok(self.repo.flush_cache_tags(&tags)?)
    }

    pub fn flush(&self) -> ServiceResult<usize> {
        Ok(self.repo.flush_cache()?)
    }

    pub fn prune(&self) -> ServiceResult<usize> {
        Ok(self.repo.prune_expired_cache(Utc::now().naive_utc())?)
    }
}

/// Drops cached queries after a write. Failures are logged only; the write
/// already succeeded.
pub fn invalidate<R>(repo: &R, tags: &[&str])
where
    R: CacheWriter + ?Sized,
{
    let tags = tags.iter().map(|tag| tag.to_string()).collect::<Vec<_>>();
    if let Err(err) = repo.flush_cache_tags(&tags) {
        log::warn!("Failed to flush cache tags {tags:?}: {err}");
    }
}

/// Part of the cache a console command acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheKind {
    #[default]
    All,
    Config,
    Views,
    Queries,
}

impl CacheKind {
    fn steps(self) -> &'static [CacheKind] {
        match self {
            CacheKind::All => &[CacheKind::Config, CacheKind::Views, CacheKind::Queries],
            CacheKind::Config => &[CacheKind::Config],
            CacheKind::Views => &[CacheKind::Views],
            CacheKind::Queries => &[CacheKind::Queries],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CacheKind::All => "all",
            CacheKind::Config => "config",
            CacheKind::Views => "views",
            CacheKind::Queries => "queries",
        }
    }
}

impl Display for CacheKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(CacheKind::All),
            "config" => Ok(CacheKind::Config),
            "views" => Ok(CacheKind::Views),
            "queries" => Ok(CacheKind::Queries),
            other => Err(format!("unknown cache type `{other}`")),
        }
    }
}

/// Outcome of one warmup or clear step.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CacheStepReport {
    pub step: String,
    pub success: bool,
    pub message: String,
}

impl CacheStepReport {
    fn from_result(step: &str, result: ServiceResult<String>) -> Self {
        match result {
            Ok(message) => Self {
                step: step.to_string(),
                success: true,
                message,
            },
            Err(err) => {
                log::error!("Cache step `{step}` failed: {err}");
                Self {
                    step: step.to_string(),
                    success: false,
                    message: err.to_string(),
                }
            }
        }
    }
}

fn warm_config() -> ServiceResult<String> {
    let config = load_server_config()
        .map_err(|e| ServiceError::Internal(format!("Configuration is invalid: {e}")))?;
    if config.secret.len() < 64 {
        return Err(ServiceError::Internal(
            "Configuration is invalid: secret must be at least 64 bytes".to_string(),
        ));
    }
    Ok(format!("configuration loaded for {}", config.domain))
}

fn warm_views(config: &ServerConfig) -> ServiceResult<String> {
    let tera = Tera::new(&config.templates_dir)
        .map_err(|e| ServiceError::Internal(format!("Template parsing error(s): {e}")))?;
    Ok(format!("{} template(s) compiled", tera.get_template_names().count()))
}

fn warm_queries<R>(repo: &R, config: &ServerConfig) -> ServiceResult<String>
where
    R: CacheReader + CacheWriter + StatsReader + ?Sized,
{
    let cache = QueryCache::new(repo, Duration::seconds(config.cache.default_ttl_seconds));

    let roles = cache.remember(ROLE_OPTIONS_KEY, &["roles"], None, || role_options(repo))?;
    let groups = cache.remember(PERMISSION_GROUPS_KEY, &["permission-groups"], None, || {
        Ok(repo.list_all_permission_groups()?)
    })?;
    cache.remember(
        DASHBOARD_KEY,
        &["dashboard"],
        Some(Duration::seconds(config.cache.dashboard_ttl_seconds)),
        || compute_dashboard_stats(repo),
    )?;

    Ok(format!(
        "cached {} role option(s), {} permission group(s) and dashboard statistics",
        roles.len(),
        groups.len()
    ))
}

/// Role options offered on the user forms.
pub fn role_options<R>(repo: &R) -> ServiceResult<Vec<SelectOption>>
where
    R: RoleReader + ?Sized,
{
    Ok(repo
        .list_all_roles(None)?
        .into_iter()
        .map(|role| SelectOption {
            value: role.id.get(),
            label: format!("{} ({})", role.name.as_str(), role.guard),
        })
        .collect())
}

/// Rebuilds the requested caches. With `force` the query cache is emptied
/// first. A failing step does not stop the remaining ones.
pub fn warmup<R>(
    repo: &R,
    config: &ServerConfig,
    kind: CacheKind,
    force: bool,
) -> Vec<CacheStepReport>
where
    R: CacheReader + CacheWriter + StatsReader + ?Sized,
{
    let mut reports = Vec::new();
    if force {
        reports.extend(clear(repo, kind, None));
    }
    for step in kind.steps() {
        let result = match step {
            CacheKind::Config => warm_config(),
            CacheKind::Views => warm_views(config),
            CacheKind::Queries => warm_queries(repo, config),
            CacheKind::All => continue,
        };
        reports.push(CacheStepReport::from_result(
            &format!("warmup:{step}"),
            result,
        ));
    }
    reports
}

/// Clears the requested caches, or only the entries tagged `tag`.
pub fn clear<R>(repo: &R, kind: CacheKind, tag: Option<&str>) -> Vec<CacheStepReport>
where
    R: CacheWriter + ?Sized,
{
    if let Some(tag) = tag {
        let result = repo
            .flush_cache_tags(&[tag.to_string()])
            .map(|removed| format!("removed {removed} entr(ies) tagged `{tag}`"))
            .map_err(ServiceError::from);
        return vec![CacheStepReport::from_result(&format!("clear:tag:{tag}"), result)];
    }

    let mut reports = Vec::new();
    for step in kind.steps() {
        let result = match step {
            // Configuration and templates are loaded per process; nothing is persisted.
            CacheKind::Config => Ok("configuration is read at startup".to_string()),
            CacheKind::Views => Ok("templates are compiled at startup".to_string()),
            CacheKind::Queries => repo
                .flush_cache()
                .map(|removed| format!("removed {removed} cached quer(ies)"))
                .map_err(ServiceError::from),
            CacheKind::All => continue,
        };
        reports.push(CacheStepReport::from_result(&format!("clear:{step}"), result));
    }
    reports
}

/// Entry, expiry and tag counters of the cache store.
pub fn status<R>(repo: &R) -> ServiceResult<CacheStats>
where
    R: CacheReader + ?Sized,
{
    Ok(repo.cache_stats(Utc::now().naive_utc())?)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    #[test]
    fn remember_returns_cached_value_without_computing() {
        let mut repo = MockRepository::new();
        repo.expect_get_cache_value()
            .returning(|_, _| Ok(Some("[1,2,3]".to_string())));
        repo.expect_put_cache_value().times(0);

        let cache = QueryCache::new(&repo, Duration::seconds(60));
        let value: Vec<i32> = cache
            .remember("numbers", &[], None, || panic!("must not compute"))
            .unwrap();

        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn remember_recomputes_undecodable_entries() {
        let mut repo = MockRepository::new();
        repo.expect_get_cache_value()
            .returning(|_, _| Ok(Some("not json".to_string())));
        repo.expect_put_cache_value()
            .withf(|key, value, expires_at, tags| {
                key == "numbers"
                    && value == "[4]"
                    && expires_at.is_some()
                    && tags == ["numbers".to_string(), QUERIES_TAG.to_string()]
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let cache = QueryCache::new(&repo, Duration::seconds(60));
        let value: Vec<i32> = cache
            .remember("numbers", &["numbers"], None, || Ok(vec![4]))
            .unwrap();

        assert_eq!(value, vec![4]);
    }

    #[test]
    fn zero_ttl_stores_without_expiry() {
        let mut repo = MockRepository::new();
        repo.expect_put_cache_value()
            .withf(|_, _, expires_at, _| expires_at.is_none())
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let cache = QueryCache::new(&repo, Duration::zero());
        cache.put("forever", &true, &[], None).unwrap();
    }

    #[test]
    fn clear_by_tag_only_flushes_that_tag() {
        let mut repo = MockRepository::new();
        repo.expect_flush_cache_tags()
            .withf(|tags| tags == ["roles".to_string()])
            .times(1)
            .returning(|_| Ok(2));
        repo.expect_flush_cache().times(0);

        let reports = clear(&repo, CacheKind::All, Some("roles"));

        assert_eq!(reports.len(), 1);
        assert!(reports[0].success);
    }

    #[test]
    fn failing_clear_step_is_reported_not_raised() {
        let mut repo = MockRepository::new();
        repo.expect_flush_cache()
            .returning(|| Err(RepositoryError::DatabaseError("locked".into())));

        let reports = clear(&repo, CacheKind::All, None);

        assert_eq!(reports.len(), 3);
        assert!(reports[0].success && reports[1].success);
        assert!(!reports[2].success);
    }

    #[test]
    fn invalidate_swallows_errors() {
        let mut repo = MockRepository::new();
        repo.expect_flush_cache_tags()
            .returning(|_| Err(RepositoryError::DatabaseError("locked".into())));

        invalidate(&repo, &["users"]);
    }

    #[test]
    fn cache_kind_parses_case_insensitively() {
        assert_eq!("Queries".parse::<CacheKind>(), Ok(CacheKind::Queries));
        assert!("sessions".parse::<CacheKind>().is_err());
    }
}
