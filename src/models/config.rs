//! Configuration model loaded from external sources.

use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers and console commands.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub templates_dir: String,
    /// Signs session cookies and JWTs; must be at least 64 bytes long.
    pub secret: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_super_admin_role")]
    pub super_admin_role: String,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
/// Location and thresholds used by the backup manager and monitor.
pub struct BackupConfig {
    pub directory: PathBuf,
    /// Filename prefix of generated archives.
    pub prefix: String,
    /// Directories and files packed by `files` and `full` backups.
    pub include_paths: Vec<PathBuf>,
    pub retention_days: i64,
    /// Newest archives never removed by cleanup.
    pub min_keep: usize,
    pub warning_age_hours: i64,
    pub unhealthy_age_hours: i64,
    pub max_storage_mb: u64,
    /// AES password used when an encrypted archive is requested.
    pub password: Option<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("storage/backups"),
            prefix: "larabasex".to_string(),
            include_paths: vec![PathBuf::from("storage/app")],
            retention_days: 30,
            min_keep: 3,
            warning_age_hours: 26,
            unhealthy_age_hours: 72,
            max_storage_mb: 5 * 1024,
            password: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_seconds: i64,
    /// TTL of the dashboard statistics entry.
    pub dashboard_ttl_seconds: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600,
            dashboard_ttl_seconds: 300,
        }
    }
}

fn default_token_ttl_minutes() -> i64 {
    60 * 24
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_super_admin_role() -> String {
    "Super Admin".to_string()
}

/// Loads `config/default.yaml`, the `APP_ENV` profile and `APP__*` variables.
pub fn load_server_config() -> Result<ServerConfig, ConfigError> {
    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    Config::builder()
        // Add `./config/default.yaml`
        .add_source(config::File::with_name("config/default"))
        // Add environment-specific overrides
        .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
        // Add settings from the environment (with a prefix of APP)
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize::<ServerConfig>()
}
