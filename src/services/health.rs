//! Aggregated health report served on `/health`.

use serde::Serialize;

use crate::repository::CacheStats;
use crate::services::ServiceResult;
use crate::services::backup::MonitorReport;

/// Verdict ordered from best to worst, so the overall status is the maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
}

impl HealthStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CheckResult {
    pub status: HealthStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HealthChecks {
    pub database: CheckResult,
    pub cache: CheckResult,
    pub backups: CheckResult,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: HealthChecks,
}

impl HealthReport {
    pub fn is_available(&self) -> bool {
        self.status != HealthStatus::Unhealthy
    }
}

/// Combines the individual checks into one report.
///
/// Backup problems degrade the report to a warning at most; they never make
/// the service itself unavailable.
pub fn check_health(
    database: Result<(), String>,
    cache: ServiceResult<CacheStats>,
    backups: &MonitorReport,
) -> HealthReport {
    let database = match database {
        Ok(()) => CheckResult {
            status: HealthStatus::Healthy,
            message: "Database connection is working.".to_string(),
            details: None,
        },
        Err(err) => {
            log::error!("Health check: database unavailable: {err}");
            CheckResult {
                status: HealthStatus::Unhealthy,
                message: format!("Database connection failed: {err}"),
                details: None,
            }
        }
    };

    let cache = match cache {
        Ok(stats) => CheckResult {
            status: HealthStatus::Healthy,
            message: "Cache store is readable.".to_string(),
            details: serde_json::to_value(stats).ok(),
        },
        Err(err) => {
            log::warn!("Health check: cache store unreadable: {err}");
            CheckResult {
                status: HealthStatus::Warning,
                message: format!("Cache store is unreadable: {err}"),
                details: None,
            }
        }
    };

    let backups = CheckResult {
        status: backups.status.min(HealthStatus::Warning),
        message: if backups.issues.is_empty() {
            "Backups are up to date.".to_string()
        } else {
            backups.issues.join(" ")
        },
        details: serde_json::to_value(&backups.metrics).ok(),
    };

    let status = database.status.max(cache.status).max(backups.status);
    HealthReport {
        status,
        checks: HealthChecks {
            database,
            cache,
            backups,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use crate::services::backup::BackupMetrics;

    fn backups(status: HealthStatus, issues: &[&str]) -> MonitorReport {
        MonitorReport {
            status,
            metrics: BackupMetrics::default(),
            issues: issues.iter().map(|issue| issue.to_string()).collect(),
        }
    }

    #[test]
    fn all_checks_passing_is_healthy() {
        let report = check_health(
            Ok(()),
            Ok(CacheStats::default()),
            &backups(HealthStatus::Healthy, &[]),
        );
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.is_available());
    }

    #[test]
    fn database_failure_is_unhealthy() {
        let report = check_health(
            Err("unable to open database file".into()),
            Ok(CacheStats::default()),
            &backups(HealthStatus::Healthy, &[]),
        );
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.is_available());
    }

    #[test]
    fn missing_backups_only_warn() {
        let report = check_health(
            Ok(()),
            Err(ServiceError::Internal("locked".into())),
            &backups(HealthStatus::Unhealthy, &["No backups found."]),
        );
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.checks.backups.message, "No backups found.");
        assert_eq!(report.checks.cache.status, HealthStatus::Warning);
    }

    #[test]
    fn serializes_lowercase_statuses() {
        let report = check_health(
            Ok(()),
            Ok(CacheStats::default()),
            &backups(HealthStatus::Healthy, &[]),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"]["cache"]["details"]["entries"], 0);
    }
}
