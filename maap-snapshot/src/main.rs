//! maap-snapshot - MAAP check-in reconciliation tool
//!
//! Assembles and stores immutable MAAP snapshots from submitted check-in
//! changes, and inspects stored snapshots.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maap_common::config::{
    default_config_path, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use maap_common::db::{init_database, ChangeType};
use maap_common::time::{parse_date, today};
use maap_snapshot::db::{list_snapshots, load_snapshot};
use maap_snapshot::{FinalizationProcessor, FinalizationRequest, SubjectScope};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const MODULE_NAME: &str = "maap-snapshot";

/// Command-line arguments for maap-snapshot
#[derive(Parser, Debug)]
#[command(name = "maap-snapshot")]
#[command(about = "MAAP check-in reconciliation and snapshot tool")]
#[command(version)]
struct Cli {
    /// Root folder holding maap.db
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to <config_dir>/maap/maap-snapshot.toml)
    #[arg(long, global = true, env = "MAAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the database
    Init,

    /// Assemble a snapshot from submitted changes and store it
    Assemble {
        #[arg(long)]
        teammate: i64,
        #[arg(long)]
        organization: i64,
        /// JSON file with the submitted changes, or `-` for stdin
        #[arg(long)]
        changes: PathBuf,
        /// Actor stamped on completion toggles (falls back to config)
        #[arg(long)]
        actor: Option<i64>,
        #[arg(long, default_value = "bulk_check_in_finalization")]
        change_type: String,
        #[arg(long)]
        reason: Option<String>,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        effective_date: Option<String>,
        /// Print the document without storing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a stored snapshot
    Show { guid: Uuid },

    /// List stored snapshots for a teammate
    List {
        #[arg(long)]
        teammate: i64,
    },

    /// List check-ins ready for finalization
    Ready {
        #[arg(long)]
        teammate: i64,
        #[arg(long)]
        organization: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(|| default_config_path(MODULE_NAME));
    let (config, config_error) = TomlConfig::load_or_default(config_path.as_deref());

    init_tracing(&config)?;

    info!(
        "Starting MAAP snapshot tool (maap-snapshot) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match (config_error, config_path.as_deref()) {
        (Some(e), _) => warn!("{} - continuing with defaults", e),
        (None, Some(path)) if path.exists() => {
            info!("Loaded configuration from {}", path.display())
        }
        (None, _) => debug!("No config file found, using defaults"),
    }

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(cli.root_folder.clone())
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match cli.command {
        Command::Init => {
            info!("Database ready");
        }
        Command::Assemble {
            teammate,
            organization,
            changes,
            actor,
            change_type,
            reason,
            effective_date,
            dry_run,
        } => {
            let change_type = ChangeType::from_str(&change_type)
                .with_context(|| format!("Unknown change type '{}'", change_type))?;
            let effective_date = match effective_date {
                Some(raw) => parse_date(&raw)?,
                None => today(),
            };
            let raw_changes = read_changes(&changes)?;

            let request = FinalizationRequest {
                scope: SubjectScope::new(teammate, organization),
                actor_id: actor.or(config.default_actor_id),
                change_type,
                reason,
                effective_date,
                raw_changes,
                dry_run,
            };
            run_assemble(pool, request).await?;
        }
        Command::Show { guid } => {
            let stored = load_snapshot(&pool, guid).await?;
            print_json(&json!({
                "summary": stored.summary,
                "created_by_id": stored.created_by_id,
                "document": stored.document,
            }))?;
        }
        Command::List { teammate } => {
            let snapshots = list_snapshots(&pool, teammate).await?;
            print_json(&snapshots)?;
        }
        Command::Ready {
            teammate,
            organization,
        } => {
            let processor = FinalizationProcessor::new(pool);
            let ready = processor
                .ready_check_ins(SubjectScope::new(teammate, organization))
                .await?;
            print_json(&ready)?;
        }
    }

    Ok(())
}

async fn run_assemble(pool: SqlitePool, request: FinalizationRequest) -> Result<()> {
    let processor = FinalizationProcessor::new(pool);
    let outcome = processor.run(request).await?;

    print_json(&json!({
        "snapshot_guid": outcome.snapshot_guid,
        "report": outcome.assembly.report,
        "document": outcome.assembly.document,
    }))
}

/// Logs go to stderr (or the configured file) so stdout stays pure JSON
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match &config.logging.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn read_changes(path: &Path) -> Result<serde_json::Value> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read changes from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read changes file {}", path.display()))?
    };

    serde_json::from_str(&content).context("Changes are not valid JSON")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
