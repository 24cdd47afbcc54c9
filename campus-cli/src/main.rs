//! Campus CLI - Command line interface for the campus portal
//!
//! Letter request workflow, dashboards, and certificate uploads.

mod commands;

use std::path::PathBuf;

use campus_core::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    CertificateArgs, DashboardArgs, LetterArgs, SeedArgs, UserArgs, VerifyArgs,
};

/// Campus portal: letter requests and certificates
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite database file (overrides config and env)
    #[arg(long, global = true, env = "CAMPUS_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Manage portal users
    #[command(visible_alias = "u")]
    User(UserArgs),

    /// Submit and process letter requests
    #[command(visible_alias = "l")]
    Letter(LetterArgs),

    /// Show request counts per stage
    Dashboard(DashboardArgs),

    /// Check stored requests against their history
    Verify(VerifyArgs),

    /// Manage student certificates
    #[command(visible_alias = "cert")]
    Certificate(CertificateArgs),

    /// Load demo users and requests
    Seed(SeedArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.db.clone())?;

    if cli.verbose {
        tracing::info!(
            db = ?config.database_path(),
            storage = ?config.storage_root(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("campus {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::User(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Letter(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Dashboard(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Verify(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Certificate(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Seed(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Config) => {
            println!("Campus Configuration");
            println!("====================");
            println!();
            println!("Database:");
            println!("  path: {}", display_path(config.database_path()));
            println!();
            println!("Storage:");
            println!("  root: {}", display_path(config.storage_root()));
            println!(
                "  max_certificate_bytes: {}",
                config.storage.max_certificate_bytes
            );
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Campus - letter request workflow for the campus portal");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn display_path(path: Option<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".to_string())
}
