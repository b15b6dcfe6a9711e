//! # Main: CLI Entry Point
//!
//! `serve` runs the admin HTTP server; `groups`, `history` and `export`
//! give read-only access to the same data from a shell.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: PostgreSQL connection.
//! - `--module` / `BULKVM_MODULE`: configuration table variant (`cloud` or
//!   `addon`). When unset, the addon's stored `proxmox_module` setting decides.

mod cli;

use anyhow::Result;
use bulkvm::schema::ModuleType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "bulkvm",
    about = "Bulk-edit Proxmox VPS product configurations"
)]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Product configuration table variant
    #[arg(long, env = "BULKVM_MODULE", value_enum)]
    module: Option<ModuleType>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the admin HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 7001)]
        port: u16,
        /// Directory with a static front end to serve at `/`
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// List product groups
    Groups,
    /// Show one page of the change log
    History {
        /// Page number, 50 entries per page
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Export a group's current settings as CSV
    Export {
        /// Group id
        #[arg(long)]
        group_id: i64,
        /// Output file (defaults to a timestamped name in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for log shippers, human-readable otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let database_url = cli.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    let database = rt.block_on(bulkvm::db::Database::open(database_url, cli.module))?;

    match &cli.command {
        Commands::Serve { port, static_dir } => rt.block_on(bulkvm::dashboard::run(
            *port,
            database,
            static_dir.as_deref(),
        )),
        Commands::Groups => cli::run_groups(&rt, &database),
        Commands::History { page } => cli::run_history(&rt, &database, *page),
        Commands::Export { group_id, output } => {
            cli::run_export(&rt, &database, *group_id, output.as_deref())
        }
    }
}
