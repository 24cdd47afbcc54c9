//! Verify command - replay history and compare with stored requests

use campus_core::{Config, LetterService, VerifyReport};
use clap::Args;

use super::{open_database, print_json};

/// Check that every request matches the replay of its history
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Only verify this request
    id: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl VerifyArgs {
    /// Execute the verify command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let service = LetterService::new(&db);

        let reports = match self.id {
            Some(id) => vec![VerifyReport {
                request_id: id,
                mismatches: service.verify(id)?,
                error: None,
            }],
            None => service.verify_all()?,
        };

        let inconsistent = reports.iter().filter(|r| !r.is_consistent()).count();

        if self.json {
            print_json(&reports)?;
        } else {
            for report in reports.iter().filter(|r| !r.is_consistent()) {
                println!("  Request {}:", report.request_id);
                if let Some(error) = &report.error {
                    println!("      {}", error);
                }
                for mismatch in &report.mismatches {
                    println!(
                        "      {}: stored {} but history gives {}",
                        mismatch.field, mismatch.stored, mismatch.replayed
                    );
                }
            }
            println!(
                "Checked {} request(s), {} inconsistent",
                reports.len(),
                inconsistent
            );
        }

        if inconsistent > 0 {
            anyhow::bail!("{} request(s) diverge from their history", inconsistent);
        }
        Ok(())
    }
}
