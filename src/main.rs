//! # fileseed CLI
//!
//! Loads a directory of YAML and Markdown files into SQLite tables.
//!
//! ## Usage
//!
//! ```bash
//! fileseed --config ./config/fileseed.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fileseed init` | Create the configured tables |
//! | `fileseed check` | Resolve each table's loader without writing |
//! | `fileseed load` | Create tables, then load the data directory in one transaction |
//! | `fileseed stats` | Print row counts per table |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fileseed::progress::ProgressMode;
use fileseed::{check, config, load, migrate, stats};

/// fileseed: populate SQLite tables from version-controlled text files.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file that declares the database, the data directory, the tables and the
/// models to load.
#[derive(Parser)]
#[command(
    name = "fileseed",
    about = "Populate SQLite tables from YAML and Markdown files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fileseed.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured tables.
    ///
    /// Idempotent: tables that already exist are left alone.
    Init,

    /// Show which loader each table's directory resolves to.
    ///
    /// Reads directory listings only; the database is not opened. Exits
    /// with an error if any table has no model or no matching loader.
    Check,

    /// Load every table from the data directory.
    ///
    /// Tables are visited in foreign-key order inside one transaction. Any
    /// error rolls back the whole load.
    Load,

    /// Print row counts per table.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Check => {
            check::run_check(&cfg)?;
        }
        Commands::Load => {
            load::run_load(&cfg, progress).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
