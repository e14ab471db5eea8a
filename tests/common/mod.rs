//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

use larabasex::db::{DbPool, establish_connection_pool};
use larabasex::models::config::{BackupConfig, CacheConfig, ServerConfig};
use larabasex::repository::DieselRepository;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Seeded super admin created by the migrations.
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "password";
pub const SUPER_ADMIN: &str = "Super Admin";

/// A migrated SQLite database in a temporary directory, removed on drop.
pub struct TestDb {
    dir: TempDir,
    path: PathBuf,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("create pool");
        {
            let mut conn = pool.get().expect("get connection");
            conn.run_pending_migrations(MIGRATIONS)
                .expect("run migrations");
        }
        Self { dir, path, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Configuration pointing at this database with backups kept inside the
/// temporary directory.
pub fn server_config(test_db: &TestDb) -> ServerConfig {
    ServerConfig {
        domain: "localhost".to_string(),
        address: "127.0.0.1".to_string(),
        port: 8080,
        database_url: test_db.path().display().to_string(),
        templates_dir: "templates/**/*".to_string(),
        secret: "test-secret-test-secret-test-secret-test-secret-test-secret-test-secret"
            .to_string(),
        token_ttl_minutes: 60,
        bcrypt_cost: 4,
        super_admin_role: SUPER_ADMIN.to_string(),
        backup: BackupConfig {
            directory: test_db.dir().join("backups"),
            include_paths: vec![],
            ..BackupConfig::default()
        },
        cache: CacheConfig::default(),
    }
}
