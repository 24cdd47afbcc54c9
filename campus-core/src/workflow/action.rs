//! Actions that move a letter request between stages

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An action recorded in the workflow history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterAction {
    /// Student creates the request
    Submit,
    /// General administration passes the request to the vice dean
    Forward,
    /// Vice dean or dean gives final approval
    Approve,
    /// Any reviewer refuses the request
    Reject,
    /// Any reviewer sends the request back for changes
    ReturnForRevision,
    /// Student sends a revised request back into review
    Resubmit,
}

impl LetterAction {
    /// Every action
    pub const ALL: [LetterAction; 6] = [
        LetterAction::Submit,
        LetterAction::Forward,
        LetterAction::Approve,
        LetterAction::Reject,
        LetterAction::ReturnForRevision,
        LetterAction::Resubmit,
    ];

    /// Name written to the history log
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterAction::Submit => "submitted",
            LetterAction::Forward => "forwarded",
            LetterAction::Approve => "approved",
            LetterAction::Reject => "rejected",
            LetterAction::ReturnForRevision => "returned_for_revision",
            LetterAction::Resubmit => "resubmitted",
        }
    }

    /// Imperative verb, as shown on a button
    pub fn verb(&self) -> &'static str {
        match self {
            LetterAction::Submit => "submit",
            LetterAction::Forward => "forward",
            LetterAction::Approve => "approve",
            LetterAction::Reject => "reject",
            LetterAction::ReturnForRevision => "return",
            LetterAction::Resubmit => "resubmit",
        }
    }
}

impl fmt::Display for LetterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterAction {
    type Err = Error;

    /// Accepts either the history name or the verb
    fn from_str(s: &str) -> Result<Self> {
        LetterAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s || action.verb() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown workflow action: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_names_and_verbs() {
        for action in LetterAction::ALL {
            assert_eq!(action.as_str().parse::<LetterAction>().unwrap(), action);
            assert_eq!(action.verb().parse::<LetterAction>().unwrap(), action);
        }
        assert!("escalated".parse::<LetterAction>().is_err());
    }
}
