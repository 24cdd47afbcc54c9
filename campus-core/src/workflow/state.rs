//! Letter request state machine
//!
//! [`LetterWorkflow`] applies actions to a [`LetterState`] and records one
//! [`HistoryEntry`] per transition. The same code path drives live requests
//! and history replay, so both agree on what every action does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::LetterAction;
use super::rules::rules_from;
use super::stage::{LetterStatus, WorkflowStage};
use super::transitions::{normalize_notes, resolve};
use crate::role::{Actor, Role};
use crate::{Error, Result};

/// Workflow fields of a letter request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterState {
    /// Current stage
    pub stage: WorkflowStage,
    /// Status implied by the stage
    pub status: LetterStatus,
    /// Submitting student
    pub student_id: i64,
    /// Approver the request is assigned to
    pub assigned_to: Option<i64>,
    /// Who forwarded the request for approval
    pub forwarded_by: Option<i64>,
    /// When it was forwarded
    pub forwarded_at: Option<DateTime<Utc>>,
    /// Who gave final approval
    pub wd1_approved_by: Option<i64>,
    /// When final approval was given
    pub wd1_approved_at: Option<DateTime<Utc>>,
    /// Notes given with final approval
    pub wd1_approval_notes: Option<String>,
    /// Time of the last transition
    pub updated_at: DateTime<Utc>,
}

impl LetterState {
    /// State of a freshly submitted request
    pub fn submitted(student_id: i64, at: DateTime<Utc>) -> Self {
        Self {
            stage: WorkflowStage::InitialReview,
            status: WorkflowStage::InitialReview.status(),
            student_id,
            assigned_to: None,
            forwarded_by: None,
            forwarded_at: None,
            wd1_approved_by: None,
            wd1_approved_at: None,
            wd1_approval_notes: None,
            updated_at: at,
        }
    }

    /// Check if no further action is possible
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The action taken
    pub action: LetterAction,
    /// Acting user
    pub actor_id: i64,
    /// The actor's role when acting
    pub actor_role: Role,
    /// Reason or notes, trimmed; blank notes are stored as `None`
    pub notes: Option<String>,
    /// When the action happened
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// The acting user as an [`Actor`]
    pub fn actor(&self) -> Actor {
        Actor::new(self.actor_id, self.actor_role)
    }
}

/// State machine for a single letter request
#[derive(Debug, Clone)]
pub struct LetterWorkflow {
    state: LetterState,
    history: Vec<HistoryEntry>,
}

impl LetterWorkflow {
    /// Start a workflow with a student's submission
    pub fn submit(actor: &Actor, notes: Option<&str>, at: DateTime<Utc>) -> Result<Self> {
        resolve(None, actor, LetterAction::Submit, notes)?;

        let entry = HistoryEntry {
            action: LetterAction::Submit,
            actor_id: actor.id,
            actor_role: actor.role,
            notes: normalize_notes(notes),
            created_at: at,
        };

        tracing::info!(
            to = %WorkflowStage::InitialReview,
            actor = %actor,
            "Letter request submitted"
        );

        Ok(Self {
            state: LetterState::submitted(actor.id, at),
            history: vec![entry],
        })
    }

    /// Resume a workflow from stored state
    ///
    /// The history starts empty; only transitions applied from here on are
    /// collected.
    pub fn from_state(state: LetterState) -> Self {
        Self {
            state,
            history: Vec::new(),
        }
    }

    /// Get the current state
    pub fn state(&self) -> &LetterState {
        &self.state
    }

    /// Get the current stage
    pub fn stage(&self) -> WorkflowStage {
        self.state.stage
    }

    /// Transitions collected by this workflow
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Split into state and collected history
    pub fn into_parts(self) -> (LetterState, Vec<HistoryEntry>) {
        (self.state, self.history)
    }

    /// Apply an action, returning the recorded history entry
    pub fn apply(
        &mut self,
        actor: &Actor,
        action: LetterAction,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<&HistoryEntry> {
        let rule = resolve(Some(&self.state), actor, action, notes)?;
        let from = self.state.stage;
        let notes = normalize_notes(notes);

        match action {
            LetterAction::Forward => {
                self.state.forwarded_by = Some(actor.id);
                self.state.forwarded_at = Some(at);
            }
            LetterAction::Approve => {
                self.state.wd1_approved_by = Some(actor.id);
                self.state.wd1_approved_at = Some(at);
                self.state.wd1_approval_notes = notes.clone();
            }
            LetterAction::Resubmit => {
                self.state.assigned_to = None;
                self.state.forwarded_by = None;
                self.state.forwarded_at = None;
            }
            LetterAction::Reject | LetterAction::ReturnForRevision | LetterAction::Submit => {}
        }

        self.state.stage = rule.to;
        self.state.status = rule.to.status();
        self.state.updated_at = at;

        tracing::info!(
            from = %from,
            to = %rule.to,
            action = %action,
            actor = %actor,
            "Letter workflow transition"
        );

        self.history.push(HistoryEntry {
            action,
            actor_id: actor.id,
            actor_role: actor.role,
            notes,
            created_at: at,
        });

        self.history
            .last()
            .ok_or_else(|| Error::Replay("History entry was not recorded".to_string()))
    }

    /// Assign the request to an approver
    ///
    /// Only meaningful while the request waits for approval.
    pub fn assign(&mut self, user_id: Option<i64>) -> Result<()> {
        if self.state.stage != WorkflowStage::Wd1Approval {
            return Err(Error::InvalidInput(format!(
                "Cannot assign a request in stage {}",
                self.state.stage
            )));
        }
        self.state.assigned_to = user_id;
        Ok(())
    }

    /// Actions the actor may take right now
    ///
    /// Actions that need notes are listed; the notes are checked when the
    /// action is applied.
    pub fn available_actions(&self, actor: &Actor) -> Vec<LetterAction> {
        rules_from(self.state.stage)
            .filter(|rule| {
                resolve(Some(&self.state), actor, rule.action, Some("notes")).is_ok()
            })
            .map(|rule| rule.action)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: Actor = Actor {
        id: 10,
        role: Role::Student,
    };
    const REVIEWER: Actor = Actor {
        id: 20,
        role: Role::AdminUmum,
    };
    const VICE_DEAN: Actor = Actor {
        id: 30,
        role: Role::Wd1,
    };
    const DEAN: Actor = Actor {
        id: 40,
        role: Role::Dean,
    };

    fn submitted() -> LetterWorkflow {
        LetterWorkflow::submit(&STUDENT, Some("For scholarship"), Utc::now()).unwrap()
    }

    #[test]
    fn test_submit_creates_initial_review() {
        let wf = submitted();
        assert_eq!(wf.stage(), WorkflowStage::InitialReview);
        assert_eq!(wf.state().status, LetterStatus::Pending);
        assert_eq!(wf.state().student_id, STUDENT.id);
        assert_eq!(wf.history().len(), 1);
        assert_eq!(wf.history()[0].action, LetterAction::Submit);
        assert_eq!(wf.history()[0].notes.as_deref(), Some("For scholarship"));
    }

    #[test]
    fn test_submit_by_non_student_refused() {
        let result = LetterWorkflow::submit(&REVIEWER, None, Utc::now());
        assert!(matches!(result, Err(Error::TransitionRefused { .. })));
    }

    #[test]
    fn test_happy_path() {
        let mut wf = submitted();
        let forwarded_at = Utc::now();
        wf.apply(&REVIEWER, LetterAction::Forward, None, forwarded_at)
            .unwrap();
        assert_eq!(wf.stage(), WorkflowStage::Wd1Approval);
        assert_eq!(wf.state().status, LetterStatus::InReview);
        assert_eq!(wf.state().forwarded_by, Some(REVIEWER.id));
        assert_eq!(wf.state().forwarded_at, Some(forwarded_at));

        let approved_at = Utc::now();
        let entry = wf
            .apply(&VICE_DEAN, LetterAction::Approve, Some(" Signed "), approved_at)
            .unwrap();
        assert_eq!(entry.notes.as_deref(), Some("Signed"));

        let state = wf.state();
        assert_eq!(state.stage, WorkflowStage::Completed);
        assert_eq!(state.status, LetterStatus::Approved);
        assert_eq!(state.wd1_approved_by, Some(VICE_DEAN.id));
        assert_eq!(state.wd1_approved_at, Some(approved_at));
        assert_eq!(state.wd1_approval_notes.as_deref(), Some("Signed"));
        assert_eq!(state.updated_at, approved_at);
        assert!(state.is_terminal());
        assert_eq!(wf.history().len(), 3);
    }

    #[test]
    fn test_dean_can_approve() {
        let mut wf = submitted();
        wf.apply(&REVIEWER, LetterAction::Forward, None, Utc::now())
            .unwrap();
        wf.apply(&DEAN, LetterAction::Approve, None, Utc::now())
            .unwrap();
        assert_eq!(wf.stage(), WorkflowStage::Completed);
    }

    #[test]
    fn test_refused_transition_changes_nothing() {
        let mut wf = submitted();
        let before = wf.state().clone();

        let result = wf.apply(&VICE_DEAN, LetterAction::Approve, None, Utc::now());
        assert!(matches!(result, Err(Error::TransitionRefused { .. })));
        assert_eq!(wf.state(), &before);
        assert_eq!(wf.history().len(), 1);
    }

    #[test]
    fn test_revision_round_trip() {
        let mut wf = submitted();
        wf.apply(&REVIEWER, LetterAction::Forward, None, Utc::now())
            .unwrap();
        wf.assign(Some(VICE_DEAN.id)).unwrap();
        wf.apply(
            &VICE_DEAN,
            LetterAction::ReturnForRevision,
            Some("Attach KRS"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(wf.stage(), WorkflowStage::RevisionRequested);
        assert_eq!(wf.state().status, LetterStatus::RevisionRequested);

        wf.apply(&STUDENT, LetterAction::Resubmit, None, Utc::now())
            .unwrap();
        assert_eq!(wf.stage(), WorkflowStage::InitialReview);
        assert_eq!(wf.state().forwarded_by, None);
        assert_eq!(wf.state().forwarded_at, None);
        assert_eq!(wf.state().assigned_to, None);
    }

    #[test]
    fn test_reject_from_initial_review() {
        let mut wf = submitted();
        assert!(wf
            .apply(&REVIEWER, LetterAction::Reject, None, Utc::now())
            .is_err());
        wf.apply(&REVIEWER, LetterAction::Reject, Some("Duplicate"), Utc::now())
            .unwrap();
        assert_eq!(wf.stage(), WorkflowStage::Rejected);
        assert!(wf.available_actions(&REVIEWER).is_empty());
    }

    #[test]
    fn test_assign_only_while_awaiting_approval() {
        let mut wf = submitted();
        assert!(wf.assign(Some(VICE_DEAN.id)).is_err());
        wf.apply(&REVIEWER, LetterAction::Forward, None, Utc::now())
            .unwrap();
        wf.assign(Some(VICE_DEAN.id)).unwrap();
        assert_eq!(wf.state().assigned_to, Some(VICE_DEAN.id));
    }

    #[test]
    fn test_available_actions() {
        let mut wf = submitted();
        assert_eq!(
            wf.available_actions(&REVIEWER),
            vec![
                LetterAction::Forward,
                LetterAction::Reject,
                LetterAction::ReturnForRevision
            ]
        );
        assert!(wf.available_actions(&VICE_DEAN).is_empty());
        assert!(wf.available_actions(&STUDENT).is_empty());

        wf.apply(&REVIEWER, LetterAction::ReturnForRevision, Some("Typo"), Utc::now())
            .unwrap();
        assert_eq!(wf.available_actions(&STUDENT), vec![LetterAction::Resubmit]);
        let stranger = Actor::new(11, Role::Student);
        assert!(wf.available_actions(&stranger).is_empty());
    }

    #[test]
    fn test_from_state_collects_only_new_history() {
        let wf = submitted();
        let (state, history) = wf.into_parts();
        assert_eq!(history.len(), 1);

        let mut resumed = LetterWorkflow::from_state(state);
        assert!(resumed.history().is_empty());
        resumed
            .apply(&REVIEWER, LetterAction::Forward, None, Utc::now())
            .unwrap();
        assert_eq!(resumed.history().len(), 1);
        assert_eq!(resumed.history()[0].actor(), REVIEWER);
    }
}
