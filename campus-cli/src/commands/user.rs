//! User management commands

use campus_core::{Config, Role, UserDirectory};
use clap::{Args, Subcommand};

use super::{open_database, print_json};

/// User management commands
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user
    Add {
        /// Display name
        name: String,

        /// Login email
        email: String,

        /// Role (admin, admin_umum, wd1, dean, finance_admin, gkm, lab_admin, student, lecturer)
        #[arg(short, long)]
        role: String,
    },

    /// List users
    List {
        /// Only users with this role
        #[arg(short, long)]
        role: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl UserArgs {
    /// Execute the user command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let users = UserDirectory::new(&db);

        match &self.command {
            UserCommand::Add { name, email, role } => {
                let role: Role = role.parse()?;
                let user = users.register(name, email, role)?;
                println!("Registered user {} ({}) as {}", user.id, user.email, user.role);
            }
            UserCommand::List { role, json } => {
                let list = match role {
                    Some(role) => users.with_role(role.parse()?)?,
                    None => users.list()?,
                };

                if *json {
                    return print_json(&list);
                }

                if list.is_empty() {
                    println!("No users.");
                    return Ok(());
                }
                for user in &list {
                    println!(
                        "  {:>4}  {:<14} {:<28} {}",
                        user.id,
                        user.role.as_str(),
                        user.email,
                        user.name
                    );
                }
            }
        }

        Ok(())
    }
}
