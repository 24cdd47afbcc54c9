//! CLI command implementations

pub mod certificate;
pub mod dashboard;
pub mod letter;
pub mod seed;
pub mod user;
pub mod verify;

pub use certificate::CertificateArgs;
pub use dashboard::DashboardArgs;
pub use letter::LetterArgs;
pub use seed::SeedArgs;
pub use user::UserArgs;
pub use verify::VerifyArgs;

use anyhow::Context;
use campus_core::Config;
use campus_db::Database;
use serde::Serialize;

/// Open the configured database
pub fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = match config.database_path() {
        Some(path) => Database::open_at(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?,
        None => Database::open().context("Failed to open database")?,
    };
    Ok(db)
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
