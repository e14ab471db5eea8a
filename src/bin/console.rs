//! Operational commands: backup management and cache maintenance.
//!
//! Exits with code 1 when a step reports failure or the backup verdict is
//! unhealthy, so the commands can run from cron and monitoring hooks.

use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;

use larabasex::db::establish_connection_pool;
use larabasex::models::config::{ServerConfig, load_server_config};
use larabasex::repository::DieselRepository;
use larabasex::services::backup::{BackupKind, BackupManager};
use larabasex::services::cache::{self, CacheKind};
use larabasex::services::health::HealthStatus;

#[derive(Parser)]
#[command(name = "console", about = "Admin service maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create, list, clean or monitor backup archives.
    #[command(name = "backup:manage")]
    Backup {
        #[arg(value_enum)]
        action: BackupAction,
        /// What to back up when running a backup.
        #[arg(long = "type", default_value = "full")]
        kind: BackupKind,
        /// Encrypt the archive with the configured password.
        #[arg(long)]
        encrypt: bool,
        /// Actually delete archives when cleaning.
        #[arg(long)]
        force: bool,
    },
    /// Warm up, clear or inspect the caches.
    #[command(name = "cache:management")]
    Cache {
        #[arg(value_enum)]
        action: CacheAction,
        #[arg(long = "type", default_value = "all")]
        kind: CacheKind,
        /// Only clear entries carrying this tag.
        #[arg(long)]
        tag: Option<String>,
        /// Clear before warming up.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BackupAction {
    Run,
    List,
    Clean,
    Monitor,
}

#[derive(Clone, Copy, ValueEnum)]
enum CacheAction {
    Warmup,
    Clear,
    Status,
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Failed to render output: {err}"),
    }
}

fn backup(
    config: &ServerConfig,
    repo: DieselRepository,
    action: BackupAction,
    kind: BackupKind,
    encrypt: bool,
    force: bool,
) -> ExitCode {
    let manager = BackupManager::new(config.backup.clone(), repo.pool().clone());
    let now = Utc::now().naive_utc();

    match action {
        BackupAction::Run => {
            let report = manager.create(kind, encrypt, now);
            println!("{}", report.message);
            exit_code(report.success)
        }
        BackupAction::List => match manager.list() {
            Ok(backups) => {
                for backup in &backups {
                    println!(
                        "{}\t{} bytes\t{}\t{}",
                        backup.name,
                        backup.size_bytes,
                        backup.modified.format("%Y-%m-%d %H:%M:%S"),
                        if backup.valid { "valid" } else { "INVALID" }
                    );
                }
                println!("{} backup(s)", backups.len());
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("Failed to list backups: {err}");
                ExitCode::FAILURE
            }
        },
        BackupAction::Clean => {
            let report = manager.clean(force, now);
            for name in &report.candidates {
                println!("{} {name}", if report.dry_run { "would remove" } else { "removed" });
            }
            println!("{}", report.message);
            exit_code(report.success)
        }
        BackupAction::Monitor => {
            let report = manager.monitor(now);
            print_json(&report);
            exit_code(report.status != HealthStatus::Unhealthy)
        }
    }
}

fn cache(
    config: &ServerConfig,
    repo: DieselRepository,
    action: CacheAction,
    kind: CacheKind,
    tag: Option<&str>,
    force: bool,
) -> ExitCode {
    let reports = match action {
        CacheAction::Warmup => cache::warmup(&repo, config, kind, force),
        CacheAction::Clear => cache::clear(&repo, kind, tag),
        CacheAction::Status => {
            return match cache::status(&repo) {
                Ok(stats) => {
                    print_json(&stats);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    log::error!("Failed to read cache status: {err}");
                    ExitCode::FAILURE
                }
            };
        }
    };

    for report in &reports {
        println!(
            "[{}] {}: {}",
            if report.success { "ok" } else { "failed" },
            report.step,
            report.message
        );
    }
    exit_code(reports.iter().all(|report| report.success))
}

fn main() -> ExitCode {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let server_config = match load_server_config() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {err}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            return ExitCode::FAILURE;
        }
    };
    let repo = DieselRepository::new(pool);

    match cli.command {
        Command::Backup {
            action,
            kind,
            encrypt,
            force,
        } => backup(&server_config, repo, action, kind, encrypt, force),
        Command::Cache {
            action,
            kind,
            tag,
            force,
        } => cache(&server_config, repo, action, kind, tag.as_deref(), force),
    }
}
