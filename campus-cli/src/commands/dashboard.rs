//! Dashboard command - request counts per stage

use campus_core::{Config, LetterService};
use clap::Args;

use super::{open_database, print_json};

/// Show request counts per workflow stage
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl DashboardArgs {
    /// Execute the dashboard command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let stats = LetterService::new(&db).stats()?;

        if self.json {
            return print_json(&stats);
        }

        println!("Letter Requests");
        println!("===============");
        println!();
        for (stage, count) in &stats.by_stage {
            println!("  {:<20} {:>5}", stage.as_str(), count);
        }
        println!();
        println!("  {:<20} {:>5}", "open", stats.open());
        println!("  {:<20} {:>5}", "total", stats.total);

        Ok(())
    }
}
