//! Dashboard queues and stat cards

use std::collections::BTreeMap;

use serde::Serialize;

use crate::role::{Actor, Role};
use crate::workflow::{queue_stages, LetterState, WorkflowStage};
use crate::Result;

/// Request counts per workflow stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Count per stage; every stage is present, possibly with zero
    pub by_stage: BTreeMap<WorkflowStage, i64>,
    /// Total number of requests
    pub total: i64,
}

impl DashboardStats {
    /// Build stats from `(stage, count)` pairs as stored
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = (&'a str, i64)>) -> Result<Self> {
        let mut by_stage: BTreeMap<WorkflowStage, i64> =
            WorkflowStage::ALL.iter().map(|stage| (*stage, 0)).collect();
        let mut total = 0;

        for (stage, count) in counts {
            let stage: WorkflowStage = stage.parse()?;
            *by_stage.entry(stage).or_default() += count;
            total += count;
        }

        Ok(Self { by_stage, total })
    }

    /// Count for one stage
    pub fn count(&self, stage: WorkflowStage) -> i64 {
        self.by_stage.get(&stage).copied().unwrap_or(0)
    }

    /// Requests still moving through the workflow
    pub fn open(&self) -> i64 {
        self.by_stage
            .iter()
            .filter(|(stage, _)| !stage.is_terminal())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Whether a request belongs in the actor's inbox
///
/// Students see their own requests that were sent back to them. Reviewers
/// and approvers see requests in the stages they act on; a request assigned
/// to a specific approver only shows up for that approver.
pub fn in_inbox(actor: &Actor, state: &LetterState) -> bool {
    if actor.role == Role::Student {
        return state.stage == WorkflowStage::RevisionRequested && state.student_id == actor.id;
    }

    if !queue_stages(actor.role).contains(&state.stage) {
        return false;
    }

    match state.assigned_to {
        Some(assignee) if state.stage == WorkflowStage::Wd1Approval => assignee == actor.id,
        _ => true,
    }
}
