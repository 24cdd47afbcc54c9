//! Letter request commands

use campus_core::{Config, HistoryEntry, LetterAction, LetterRequest, LetterService, LetterType};
use clap::{Args, Subcommand};

use super::{open_database, print_json};

/// Letter request commands
#[derive(Args, Debug)]
pub struct LetterArgs {
    #[command(subcommand)]
    pub command: LetterCommand,
}

#[derive(Subcommand, Debug)]
pub enum LetterCommand {
    /// Submit a new request as a student
    Submit {
        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Letter type (e.g., active_student, research_permit)
        #[arg(short = 't', long = "type")]
        letter_type: String,

        /// Short title
        #[arg(long)]
        title: String,

        /// Why the letter is needed
        #[arg(short, long)]
        purpose: Option<String>,
    },

    /// Forward a request for WD1 approval
    Forward {
        /// Request ID
        id: i64,

        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Assign to a specific WD1 or dean
        #[arg(long, value_name = "USER_ID")]
        assign: Option<i64>,

        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Give final approval
    Approve {
        /// Request ID
        id: i64,

        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Approval notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Reject a request
    Reject {
        /// Request ID
        id: i64,

        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Reason for the rejection
        #[arg(short, long)]
        reason: String,
    },

    /// Return a request to the student for revision
    Return {
        /// Request ID
        id: i64,

        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// What needs to change
        #[arg(short, long)]
        notes: String,
    },

    /// Resubmit a revised request
    Resubmit {
        /// Request ID
        id: i64,

        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show a request
    Show {
        /// Request ID
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a request's audit trail
    History {
        /// Request ID
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List requests, newest first
    List {
        /// Only requests by this student
        #[arg(long, value_name = "USER_ID")]
        student: Option<i64>,

        /// Maximum number of requests
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Requests waiting for a user to act
    Inbox {
        /// User whose inbox to show
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Actions a user may take on a request
    Actions {
        /// Request ID
        id: i64,

        /// Acting user ID
        #[arg(long = "as", value_name = "USER_ID")]
        actor: i64,

        /// Explain why a specific action is or is not possible
        #[arg(long)]
        explain: Option<String>,
    },
}

impl LetterArgs {
    /// Execute the letter command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let service = LetterService::new(&db);

        match &self.command {
            LetterCommand::Submit {
                actor,
                letter_type,
                title,
                purpose,
            } => {
                let letter_type: LetterType = letter_type.parse()?;
                let request = service.submit(*actor, letter_type, title, purpose.as_deref())?;
                println!("Submitted request {}", request.id);
                print_request(&request);
            }
            LetterCommand::Forward {
                id,
                actor,
                assign,
                notes,
            } => {
                let request = service.forward(*actor, *id, *assign, notes.as_deref())?;
                print_transition(LetterAction::Forward, &request);
            }
            LetterCommand::Approve { id, actor, notes } => {
                let request = service.approve(*actor, *id, notes.as_deref())?;
                print_transition(LetterAction::Approve, &request);
            }
            LetterCommand::Reject { id, actor, reason } => {
                let request = service.reject(*actor, *id, reason)?;
                print_transition(LetterAction::Reject, &request);
            }
            LetterCommand::Return { id, actor, notes } => {
                let request = service.return_for_revision(*actor, *id, notes)?;
                print_transition(LetterAction::ReturnForRevision, &request);
            }
            LetterCommand::Resubmit { id, actor, notes } => {
                let request = service.resubmit(*actor, *id, notes.as_deref())?;
                print_transition(LetterAction::Resubmit, &request);
            }
            LetterCommand::Show { id, json } => {
                let request = service.get(*id)?;
                if *json {
                    return print_json(&request);
                }
                print_request(&request);
            }
            LetterCommand::History { id, json } => {
                let history = service.history(*id)?;
                if *json {
                    return print_json(&history);
                }
                println!("History of request {}:", id);
                for entry in &history {
                    print_entry(entry);
                }
            }
            LetterCommand::List {
                student,
                limit,
                json,
            } => {
                let mut requests = match student {
                    Some(student) => service.list_for_student(*student)?,
                    None => service.list_all(*limit)?,
                };
                if let Some(limit) = limit {
                    requests.truncate(*limit);
                }
                if *json {
                    return print_json(&requests);
                }
                print_list(&requests);
            }
            LetterCommand::Inbox { actor, json } => {
                let requests = service.inbox(*actor)?;
                if *json {
                    return print_json(&requests);
                }
                print_list(&requests);
            }
            LetterCommand::Actions { id, actor, explain } => {
                if let Some(action) = explain {
                    let action: LetterAction = action.parse()?;
                    let result = service.check(*actor, Some(*id), action, Some("-"))?;
                    match (result.blocking_reason(), result.suggestion()) {
                        (Some(reason), Some(suggestion)) => {
                            println!("Cannot {}: {}", action.verb(), reason);
                            println!("  {}", suggestion);
                        }
                        _ => println!("User {} may {} request {}", actor, action.verb(), id),
                    }
                    return Ok(());
                }

                let actions = service.available_actions(*actor, *id)?;
                if actions.is_empty() {
                    println!("No actions available.");
                } else {
                    let verbs: Vec<&str> = actions.iter().map(|a| a.verb()).collect();
                    println!("Available actions: {}", verbs.join(", "));
                }
            }
        }

        Ok(())
    }
}

fn print_transition(action: LetterAction, request: &LetterRequest) {
    println!(
        "Request {} {} -> {} ({})",
        request.id,
        action,
        request.state.stage,
        request.state.status
    );
}

fn print_request(request: &LetterRequest) {
    let state = &request.state;
    println!("  Request {}: {}", request.id, request.title);
    println!("      Type: {}", request.letter_type.description());
    if let Some(purpose) = &request.purpose {
        println!("      Purpose: {}", purpose);
    }
    println!("      Student: {}", state.student_id);
    println!("      Stage: {} ({})", state.stage, state.status);
    println!(
        "      Submitted: {}",
        request.request_date.format("%Y-%m-%d %H:%M")
    );
    if let (Some(by), Some(at)) = (state.forwarded_by, state.forwarded_at) {
        println!("      Forwarded by user {} at {}", by, at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(assignee) = state.assigned_to {
        println!("      Assigned to user {}", assignee);
    }
    if let (Some(by), Some(at)) = (state.wd1_approved_by, state.wd1_approved_at) {
        println!("      Approved by user {} at {}", by, at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(notes) = &state.wd1_approval_notes {
        println!("      Approval notes: {}", notes);
    }
}

fn print_entry(entry: &HistoryEntry) {
    print!(
        "  {}  {:<22} user {} ({})",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.action.as_str(),
        entry.actor_id,
        entry.actor_role
    );
    match &entry.notes {
        Some(notes) => println!(": {}", notes),
        None => println!(),
    }
}

fn print_list(requests: &[LetterRequest]) {
    if requests.is_empty() {
        println!("No requests.");
        return;
    }
    for request in requests {
        println!(
            "  {:>4}  {:<20} {:<18} student {:<4} {}",
            request.id,
            request.state.stage.as_str(),
            request.letter_type.as_str(),
            request.state.student_id,
            request.title
        );
    }
}
