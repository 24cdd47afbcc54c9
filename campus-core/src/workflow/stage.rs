//! Workflow stages and the status each one implies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Stage of a letter request in the approval workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Waiting for the general administration office
    InitialReview,
    /// Waiting for the vice dean (or dean)
    Wd1Approval,
    /// Sent back to the student for changes
    RevisionRequested,
    /// Approved; the letter can be issued
    Completed,
    /// Refused
    Rejected,
}

impl WorkflowStage {
    /// Every stage, in workflow order
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::InitialReview,
        WorkflowStage::Wd1Approval,
        WorkflowStage::RevisionRequested,
        WorkflowStage::Completed,
        WorkflowStage::Rejected,
    ];

    /// Stored name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::InitialReview => "initial_review",
            WorkflowStage::Wd1Approval => "wd1_approval",
            WorkflowStage::RevisionRequested => "revision_requested",
            WorkflowStage::Completed => "completed",
            WorkflowStage::Rejected => "rejected",
        }
    }

    /// The status a request in this stage has
    pub fn status(&self) -> LetterStatus {
        match self {
            WorkflowStage::InitialReview => LetterStatus::Pending,
            WorkflowStage::Wd1Approval => LetterStatus::InReview,
            WorkflowStage::RevisionRequested => LetterStatus::RevisionRequested,
            WorkflowStage::Completed => LetterStatus::Approved,
            WorkflowStage::Rejected => LetterStatus::Rejected,
        }
    }

    /// No action leaves a terminal stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Completed | WorkflowStage::Rejected)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            WorkflowStage::InitialReview => "Awaiting review by general administration",
            WorkflowStage::Wd1Approval => "Awaiting vice dean approval",
            WorkflowStage::RevisionRequested => "Returned to the student for revision",
            WorkflowStage::Completed => "Approved",
            WorkflowStage::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WorkflowStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown workflow stage: {}", s)))
    }
}

/// Status shown to users; a function of the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    Pending,
    InReview,
    RevisionRequested,
    Approved,
    Rejected,
}

impl LetterStatus {
    /// Stored name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterStatus::Pending => "pending",
            LetterStatus::InReview => "in_review",
            LetterStatus::RevisionRequested => "revision_requested",
            LetterStatus::Approved => "approved",
            LetterStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LetterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WorkflowStage::ALL
            .iter()
            .map(|stage| stage.status())
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown letter status: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_stage_round_trip() {
        for stage in WorkflowStage::ALL {
            assert_eq!(stage.as_str().parse::<WorkflowStage>().unwrap(), stage);
            assert_eq!(
                stage.status().as_str().parse::<LetterStatus>().unwrap(),
                stage.status()
            );
        }
    }

    #[test]
    fn test_each_stage_has_distinct_status() {
        let statuses: HashSet<_> = WorkflowStage::ALL.iter().map(|s| s.status()).collect();
        assert_eq!(statuses.len(), WorkflowStage::ALL.len());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(WorkflowStage::Completed.is_terminal());
        assert!(WorkflowStage::Rejected.is_terminal());
        assert!(!WorkflowStage::InitialReview.is_terminal());
        assert!(!WorkflowStage::Wd1Approval.is_terminal());
        assert!(!WorkflowStage::RevisionRequested.is_terminal());
    }

    #[test]
    fn test_unknown_stage() {
        assert!("archived".parse::<WorkflowStage>().is_err());
        assert!("archived".parse::<LetterStatus>().is_err());
    }
}
