use std::fs::{self, File};
use std::time::SystemTime;

use chrono::{Duration, Utc};
use zip::ZipArchive;

use larabasex::services::backup::{BackupKind, BackupManager, is_valid_archive};
use larabasex::services::health::HealthStatus;

mod common;

fn entry_names(path: &std::path::Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

#[test]
fn database_backup_contains_a_snapshot() {
    let test_db = common::TestDb::new("database_backup_contains_a_snapshot.db");
    let config = common::server_config(&test_db);
    let manager = BackupManager::new(config.backup.clone(), test_db.pool());

    let report = manager.create(BackupKind::Database, false, Utc::now().naive_utc());

    assert!(report.success, "{}", report.message);
    let path = report.path.unwrap();
    assert!(is_valid_archive(&path));
    assert_eq!(entry_names(&path), vec!["database.sqlite".to_string()]);

    // The temporary snapshot is removed after packing.
    let leftovers = fs::read_dir(&config.backup.directory)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(".snapshot-"))
        .count();
    assert_eq!(leftovers, 0);

    let report = manager.monitor(Utc::now().naive_utc());
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(report.metrics.count, 1);
}

#[test]
fn full_backup_packs_included_files() {
    let test_db = common::TestDb::new("full_backup_packs_included_files.db");
    let mut config = common::server_config(&test_db).backup;
    let uploads = test_db.dir().join("uploads");
    fs::create_dir_all(&uploads).unwrap();
    fs::write(uploads.join("avatar.txt"), "pixels").unwrap();
    config.include_paths = vec![uploads];

    let manager = BackupManager::new(config, test_db.pool());
    let report = manager.create(BackupKind::Full, false, Utc::now().naive_utc());

    assert!(report.success, "{}", report.message);
    let names = entry_names(&report.path.unwrap());
    assert!(names.contains(&"database.sqlite".to_string()));
    assert!(names.iter().any(|name| name.ends_with("uploads/avatar.txt")));
}

#[test]
fn encrypted_backup_requires_a_password() {
    let test_db = common::TestDb::new("encrypted_backup_requires_a_password.db");
    let config = common::server_config(&test_db).backup;
    let manager = BackupManager::new(config.clone(), test_db.pool());

    let report = manager.create(BackupKind::Database, true, Utc::now().naive_utc());
    assert!(!report.success);
    assert!(manager.list().unwrap().is_empty());

    let mut config = config;
    config.password = Some("s3cret".to_string());
    let manager = BackupManager::new(config, test_db.pool());
    let report = manager.create(BackupKind::Database, true, Utc::now().naive_utc());
    assert!(report.success, "{}", report.message);
    assert!(is_valid_archive(&report.path.unwrap()));
}

#[test]
fn clean_is_a_dry_run_unless_forced() {
    let test_db = common::TestDb::new("clean_is_a_dry_run_unless_forced.db");
    let mut config = common::server_config(&test_db).backup;
    config.min_keep = 1;
    config.retention_days = 7;
    let manager = BackupManager::new(config, test_db.pool());

    let now = Utc::now().naive_utc();
    let newest = manager.create(BackupKind::Database, false, now);
    let older = manager.create(BackupKind::Database, false, now - Duration::days(20));
    let oldest = manager.create(BackupKind::Database, false, now - Duration::days(40));
    assert!(newest.success && older.success && oldest.success);

    let age = |days: u64| SystemTime::now() - std::time::Duration::from_secs(days * 24 * 3600);
    File::options()
        .write(true)
        .open(older.path.as_ref().unwrap())
        .unwrap()
        .set_modified(age(20))
        .unwrap();
    File::options()
        .write(true)
        .open(oldest.path.as_ref().unwrap())
        .unwrap()
        .set_modified(age(40))
        .unwrap();

    let dry_run = manager.clean(false, now);
    assert!(dry_run.dry_run);
    assert_eq!(dry_run.candidates.len(), 2);
    assert_eq!(dry_run.kept, 1);
    assert_eq!(manager.list().unwrap().len(), 3);

    let forced = manager.clean(true, now);
    assert!(forced.success);
    assert_eq!(forced.candidates.len(), 2);
    let remaining = manager.list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(Some(&remaining[0].path), newest.path.as_ref());
}

#[test]
fn files_backup_skips_the_backup_directory_however_spelled() {
    let test_db = common::TestDb::new("files_backup_skips_the_backup_directory.db");
    let storage = test_db.dir().join("storage");
    let uploads = storage.join("uploads");
    fs::create_dir_all(&uploads).unwrap();
    fs::write(uploads.join("report.pdf"), "pdf").unwrap();

    let mut config = common::server_config(&test_db).backup;
    config.directory = storage.join("backups");
    // Resolves to `storage`, which holds the backup directory.
    config.include_paths = vec![uploads.join("..")];
    let manager = BackupManager::new(config, test_db.pool());

    let first = manager.create(BackupKind::Database, false, Utc::now().naive_utc());
    assert!(first.success, "{}", first.message);

    let report = manager.create(
        BackupKind::Files,
        false,
        Utc::now().naive_utc() + Duration::seconds(1),
    );
    assert!(report.success, "{}", report.message);

    let names = entry_names(&report.path.unwrap());
    assert!(names.iter().any(|name| name.ends_with("report.pdf")));
    assert!(names.iter().all(|name| !name.ends_with(".zip")), "{names:?}");
}
