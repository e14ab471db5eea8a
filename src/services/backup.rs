//! Backup archives: creation, listing, retention cleanup and monitoring.
//!
//! Every operation reports its outcome instead of returning an error, so the
//! console can print a status line per step and pick an exit code.

use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use zip::write::{FileOptions, SimpleFileOptions};
use zip::{AesMode, CompressionMethod, ZipWriter};

use crate::db::{DbPool, get_connection};
use crate::models::config::BackupConfig;
use crate::services::health::HealthStatus;

const ZIP_LOCAL_HEADER: &[u8; 4] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8; 4] = b"PK\x05\x06";
const DATABASE_ENTRY: &str = "database.sqlite";

#[derive(Debug, Error)]
enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("database snapshot failed: {0}")]
    Database(String),
    #[error("encryption requested but no backup password is configured")]
    MissingPassword,
}

/// What a backup archive contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Database,
    Files,
    #[default]
    Full,
}

impl BackupKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            BackupKind::Database => "database",
            BackupKind::Files => "files",
            BackupKind::Full => "full",
        }
    }

    fn includes_database(self) -> bool {
        matches!(self, BackupKind::Database | BackupKind::Full)
    }

    fn includes_files(self) -> bool {
        matches!(self, BackupKind::Files | BackupKind::Full)
    }
}

impl Display for BackupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(BackupKind::Database),
            "files" => Ok(BackupKind::Files),
            "full" => Ok(BackupKind::Full),
            other => Err(format!("unknown backup type `{other}`")),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BackupReport {
    pub success: bool,
    pub kind: BackupKind,
    pub path: Option<PathBuf>,
    pub size_bytes: u64,
    pub message: String,
}

/// One archive found in the backup directory.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BackupFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: NaiveDateTime,
    pub valid: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CleanReport {
    pub success: bool,
    pub dry_run: bool,
    /// Archives removed, or that would be removed on a dry run.
    pub candidates: Vec<String>,
    pub kept: usize,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct BackupMetrics {
    pub count: usize,
    pub total_size_bytes: u64,
    pub newest_age_hours: Option<i64>,
    pub newest_valid: Option<bool>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MonitorReport {
    pub status: HealthStatus,
    pub metrics: BackupMetrics,
    pub issues: Vec<String>,
}

/// Checks the zip signature at the start of the file.
pub fn is_valid_archive(path: &Path) -> bool {
    let mut header = [0u8; 4];
    match File::open(path).and_then(|mut file| file.read_exact(&mut header)) {
        Ok(()) => &header == ZIP_LOCAL_HEADER || &header == ZIP_EMPTY_ARCHIVE,
        Err(_) => false,
    }
}

/// Archives in the configured directory, newest first.
pub fn list_backups(config: &BackupConfig) -> io::Result<Vec<BackupFile>> {
    let prefix = format!("{}-", config.prefix);
    let mut backups = Vec::new();

    for entry in fs::read_dir(&config.directory)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) || path.extension().is_none_or(|ext| ext != "zip") {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        backups.push(BackupFile {
            valid: is_valid_archive(&path),
            modified: DateTime::<Utc>::from(metadata.modified()?).naive_utc(),
            size_bytes: metadata.len(),
            name,
            path,
        });
    }

    backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
    Ok(backups)
}

/// Health verdict over the backup directory at `now`.
pub fn monitor(config: &BackupConfig, now: NaiveDateTime) -> MonitorReport {
    let mut metrics = BackupMetrics::default();
    let mut issues = Vec::new();
    let mut status = HealthStatus::Healthy;

    if !config.directory.is_dir() {
        issues.push(format!(
            "Backup directory {} does not exist.",
            config.directory.display()
        ));
        return MonitorReport {
            status: HealthStatus::Unhealthy,
            metrics,
            issues,
        };
    }

    let backups = match list_backups(config) {
        Ok(backups) => backups,
        Err(err) => {
            log::error!("Failed to read backup directory: {err}");
            issues.push(format!("Backup directory is unreadable: {err}"));
            return MonitorReport {
                status: HealthStatus::Unhealthy,
                metrics,
                issues,
            };
        }
    };

    metrics.count = backups.len();
    metrics.total_size_bytes = backups.iter().map(|backup| backup.size_bytes).sum();

    let Some(newest) = backups.first() else {
        issues.push("No backups found.".to_string());
        return MonitorReport {
            status: HealthStatus::Unhealthy,
            metrics,
            issues,
        };
    };

    let age_hours = (now - newest.modified).num_hours();
    metrics.newest_age_hours = Some(age_hours);
    metrics.newest_valid = Some(newest.valid);

    if !newest.valid {
        issues.push(format!("Latest backup {} is not a valid archive.", newest.name));
        status = HealthStatus::Unhealthy;
    }
    if age_hours > config.unhealthy_age_hours {
        issues.push(format!("Latest backup is {age_hours} hours old."));
        status = HealthStatus::Unhealthy;
    } else if age_hours > config.warning_age_hours {
        issues.push(format!("Latest backup is {age_hours} hours old."));
        status = status.max(HealthStatus::Warning);
    }

    let limit = config.max_storage_mb.saturating_mul(1024 * 1024);
    if metrics.total_size_bytes > limit {
        issues.push(format!(
            "Backups use {} MB, above the {} MB limit.",
            metrics.total_size_bytes / (1024 * 1024),
            config.max_storage_mb
        ));
        status = status.max(HealthStatus::Warning);
    }

    let invalid = backups.iter().skip(1).filter(|backup| !backup.valid).count();
    if invalid > 0 {
        issues.push(format!("{invalid} older backup(s) are not valid archives."));
        status = status.max(HealthStatus::Warning);
    }

    MonitorReport {
        status,
        metrics,
        issues,
    }
}

/// Entry name inside the archive for a filesystem path.
fn entry_name(path: &Path) -> String {
    let parts = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>();
    format!("files/{}", parts.join("/"))
}

/// Creates, lists and prunes archives for one backup directory.
pub struct BackupManager {
    config: BackupConfig,
    pool: DbPool,
}

impl BackupManager {
    pub fn new(config: BackupConfig, pool: DbPool) -> Self {
        Self { config, pool }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Writes a new archive. Failures are logged and reported.
    pub fn create(&self, kind: BackupKind, encrypt: bool, now: NaiveDateTime) -> BackupReport {
        let file_name = format!(
            "{}-{}-{}.zip",
            self.config.prefix,
            kind,
            now.format("%Y%m%d-%H%M%S")
        );
        let path = self.config.directory.join(file_name);

        match self.write_archive(&path, kind, encrypt) {
            Ok(size_bytes) => {
                log::info!("Backup {} created ({size_bytes} bytes)", path.display());
                BackupReport {
                    success: true,
                    kind,
                    message: format!("Backup created at {}.", path.display()),
                    path: Some(path),
                    size_bytes,
                }
            }
            Err(err) => {
                log::error!("Backup {kind} failed: {err}");
                if path.exists() {
                    if let Err(remove_err) = fs::remove_file(&path) {
                        log::warn!(
                            "Failed to remove partial backup {}: {remove_err}",
                            path.display()
                        );
                    }
                }
                BackupReport {
                    success: false,
                    kind,
                    path: None,
                    size_bytes: 0,
                    message: format!("Backup failed: {err}"),
                }
            }
        }
    }

    fn write_archive(
        &self,
        path: &Path,
        kind: BackupKind,
        encrypt: bool,
    ) -> Result<u64, BackupError> {
        let password = match (encrypt, self.config.password.as_deref()) {
            (false, _) => None,
            (true, Some(password)) if !password.is_empty() => Some(password),
            (true, _) => return Err(BackupError::MissingPassword),
        };

        fs::create_dir_all(&self.config.directory)?;
        let base = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        let options: FileOptions<'_, ()> = match password {
            Some(password) => base.with_aes_encryption(AesMode::Aes256, password),
            None => base,
        };

        let mut zip = ZipWriter::new(File::create(path)?);

        if kind.includes_database() {
            let snapshot = self.snapshot_database()?;
            let result = File::open(&snapshot).map_err(BackupError::from).and_then(|mut file| {
                zip.start_file(DATABASE_ENTRY, options.clone())?;
                io::copy(&mut file, &mut zip)?;
                Ok(())
            });
            if let Err(err) = fs::remove_file(&snapshot) {
                log::warn!("Failed to remove snapshot {}: {err}", snapshot.display());
            }
            result?;
        }

        if kind.includes_files() {
            let backup_dir = fs::canonicalize(&self.config.directory)?;
            for include in &self.config.include_paths {
                if !include.exists() {
                    log::warn!("Backup include path {} does not exist", include.display());
                    continue;
                }
                self.add_path(&mut zip, include, &options, &backup_dir)?;
            }
        }

        zip.finish()?;
        Ok(fs::metadata(path)?.len())
    }

    /// Copies the live database with `VACUUM INTO`, which is safe under WAL.
    fn snapshot_database(&self) -> Result<PathBuf, BackupError> {
        let snapshot = self
            .config
            .directory
            .join(format!(".snapshot-{}.sqlite", Uuid::new_v4()));
        let target = snapshot.to_string_lossy().replace('\'', "''");

        let mut conn =
            get_connection(&self.pool).map_err(|e| BackupError::Database(e.to_string()))?;
        conn.batch_execute(&format!("VACUUM INTO '{target}';"))
            .map_err(|e| BackupError::Database(e.to_string()))?;
        Ok(snapshot)
    }

    fn add_path(
        &self,
        zip: &mut ZipWriter<File>,
        path: &Path,
        options: &FileOptions<'_, ()>,
        backup_dir: &Path,
    ) -> Result<(), BackupError> {
        // Never pack the archives themselves, however either path is spelled.
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if resolved.starts_with(backup_dir) {
            return Ok(());
        }

        if path.is_dir() {
            zip.add_directory(entry_name(path), options.clone())?;
            let mut entries = fs::read_dir(path)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<io::Result<Vec<_>>>()?;
            entries.sort();
            for entry in entries {
                self.add_path(zip, &entry, options, backup_dir)?;
            }
        } else if path.is_file() {
            zip.start_file(entry_name(path), options.clone())?;
            io::copy(&mut File::open(path)?, zip)?;
        }
        Ok(())
    }

    pub fn list(&self) -> io::Result<Vec<BackupFile>> {
        if !self.config.directory.is_dir() {
            return Ok(Vec::new());
        }
        list_backups(&self.config)
    }

    /// Removes archives past the retention period, always keeping the newest
    /// `min_keep`. Without `force` nothing is deleted.
    pub fn clean(&self, force: bool, now: NaiveDateTime) -> CleanReport {
        let backups = match self.list() {
            Ok(backups) => backups,
            Err(err) => {
                log::error!("Failed to list backups for cleanup: {err}");
                return CleanReport {
                    success: false,
                    dry_run: !force,
                    candidates: Vec::new(),
                    kept: 0,
                    message: format!("Cleanup failed: {err}"),
                };
            }
        };

        let cutoff = now - Duration::days(self.config.retention_days);
        let candidates = backups
            .iter()
            .skip(self.config.min_keep)
            .filter(|backup| backup.modified < cutoff)
            .collect::<Vec<_>>();
        let kept = backups.len() - candidates.len();
        let names = candidates
            .iter()
            .map(|backup| backup.name.clone())
            .collect::<Vec<_>>();

        if !force {
            return CleanReport {
                success: true,
                dry_run: true,
                message: format!("{} backup(s) would be removed.", names.len()),
                candidates: names,
                kept,
            };
        }

        let mut failures = 0;
        for backup in &candidates {
            match fs::remove_file(&backup.path) {
                Ok(()) => log::info!("Removed old backup {}", backup.name),
                Err(err) => {
                    failures += 1;
                    log::error!("Failed to remove backup {}: {err}", backup.name);
                }
            }
        }

        CleanReport {
            success: failures == 0,
            dry_run: false,
            message: if failures == 0 {
                format!("{} backup(s) removed.", names.len())
            } else {
                format!("{failures} of {} backup(s) could not be removed.", names.len())
            },
            candidates: names,
            kept,
        }
    }

    pub fn monitor(&self, now: NaiveDateTime) -> MonitorReport {
        monitor(&self.config, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::SystemTime;

    fn config(dir: &Path) -> BackupConfig {
        BackupConfig {
            directory: dir.to_path_buf(),
            prefix: "app".into(),
            include_paths: vec![],
            retention_days: 7,
            min_keep: 1,
            warning_age_hours: 24,
            unhealthy_age_hours: 72,
            max_storage_mb: 100,
            password: None,
        }
    }

    fn write_archive(dir: &Path, name: &str, header: &[u8], age: Duration) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(header).unwrap();
        file.write_all(&[0u8; 28]).unwrap();
        let modified = SystemTime::now() - age.to_std().unwrap();
        file.set_modified(modified).unwrap();
        path
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    #[test]
    fn parses_backup_kinds() {
        assert_eq!("Database".parse::<BackupKind>(), Ok(BackupKind::Database));
        assert_eq!("full".parse::<BackupKind>(), Ok(BackupKind::Full));
        assert!("everything".parse::<BackupKind>().is_err());
    }

    #[test]
    fn header_check_accepts_zip_signatures_only() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_archive(dir.path(), "app-a.zip", ZIP_LOCAL_HEADER, Duration::zero());
        let empty = write_archive(dir.path(), "app-b.zip", ZIP_EMPTY_ARCHIVE, Duration::zero());
        let bad = write_archive(dir.path(), "app-c.zip", b"GIF8", Duration::zero());

        assert!(is_valid_archive(&good));
        assert!(is_valid_archive(&empty));
        assert!(!is_valid_archive(&bad));
        assert!(!is_valid_archive(&dir.path().join("missing.zip")));
    }

    #[test]
    fn missing_directory_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let report = monitor(&config(&dir.path().join("nope")), now());
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn empty_directory_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let report = monitor(&config(dir.path()), now());
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.issues, vec!["No backups found.".to_string()]);
    }

    #[test]
    fn fresh_valid_backup_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "app-full-1.zip", ZIP_LOCAL_HEADER, Duration::hours(1));
        write_archive(dir.path(), "other.zip", b"junk", Duration::hours(1));

        let report = monitor(&config(dir.path()), now());

        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.metrics.count, 1);
        assert_eq!(report.metrics.newest_valid, Some(true));
    }

    #[test]
    fn stale_backup_warns_then_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "app-full-1.zip", ZIP_LOCAL_HEADER, Duration::hours(30));
        assert_eq!(monitor(&config(dir.path()), now()).status, HealthStatus::Warning);

        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "app-full-1.zip", ZIP_LOCAL_HEADER, Duration::hours(80));
        assert_eq!(monitor(&config(dir.path()), now()).status, HealthStatus::Unhealthy);
    }

    #[test]
    fn corrupt_newest_is_unhealthy_but_corrupt_older_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "app-full-1.zip", ZIP_LOCAL_HEADER, Duration::hours(5));
        write_archive(dir.path(), "app-full-2.zip", b"oops", Duration::hours(1));
        assert_eq!(monitor(&config(dir.path()), now()).status, HealthStatus::Unhealthy);

        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "app-full-1.zip", b"oops", Duration::hours(5));
        write_archive(dir.path(), "app-full-2.zip", ZIP_LOCAL_HEADER, Duration::hours(1));
        let report = monitor(&config(dir.path()), now());
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn storage_limit_warns() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "app-full-1.zip", ZIP_LOCAL_HEADER, Duration::hours(1));
        let mut config = config(dir.path());
        config.max_storage_mb = 0;

        assert_eq!(monitor(&config, now()).status, HealthStatus::Warning);
    }
}
