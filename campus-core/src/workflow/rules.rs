//! Transition table for the letter approval workflow
//!
//! One rule per (stage, action) pair. A request with no current stage is
//! being created, which only `Submit` allows.

use super::action::LetterAction;
use super::stage::WorkflowStage;
use crate::role::Role;

/// A single allowed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Stage the request must be in (`None` for creation)
    pub from: Option<WorkflowStage>,
    /// The action taken
    pub action: LetterAction,
    /// Roles allowed to take the action
    pub roles: &'static [Role],
    /// Stage the request ends up in
    pub to: WorkflowStage,
    /// Whether a non-empty reason must accompany the action
    pub requires_notes: bool,
    /// Whether only the submitting student may take the action
    pub owner_only: bool,
}

impl TransitionRule {
    /// Check whether a role may take this transition
    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

const REVIEWERS: &[Role] = &[Role::AdminUmum];
const APPROVERS: &[Role] = &[Role::Wd1, Role::Dean];
const STUDENTS: &[Role] = &[Role::Student];

/// Every allowed transition
pub const RULES: &[TransitionRule] = &[
    TransitionRule {
        from: None,
        action: LetterAction::Submit,
        roles: STUDENTS,
        to: WorkflowStage::InitialReview,
        requires_notes: false,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::InitialReview),
        action: LetterAction::Forward,
        roles: REVIEWERS,
        to: WorkflowStage::Wd1Approval,
        requires_notes: false,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::InitialReview),
        action: LetterAction::Reject,
        roles: REVIEWERS,
        to: WorkflowStage::Rejected,
        requires_notes: true,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::InitialReview),
        action: LetterAction::ReturnForRevision,
        roles: REVIEWERS,
        to: WorkflowStage::RevisionRequested,
        requires_notes: true,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::Wd1Approval),
        action: LetterAction::Approve,
        roles: APPROVERS,
        to: WorkflowStage::Completed,
        requires_notes: false,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::Wd1Approval),
        action: LetterAction::Reject,
        roles: APPROVERS,
        to: WorkflowStage::Rejected,
        requires_notes: true,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::Wd1Approval),
        action: LetterAction::ReturnForRevision,
        roles: APPROVERS,
        to: WorkflowStage::RevisionRequested,
        requires_notes: true,
        owner_only: false,
    },
    TransitionRule {
        from: Some(WorkflowStage::RevisionRequested),
        action: LetterAction::Resubmit,
        roles: STUDENTS,
        to: WorkflowStage::InitialReview,
        requires_notes: false,
        owner_only: true,
    },
];

/// Look up the rule for an action taken from a stage
pub fn find_rule(
    from: Option<WorkflowStage>,
    action: LetterAction,
) -> Option<&'static TransitionRule> {
    RULES
        .iter()
        .find(|rule| rule.from == from && rule.action == action)
}

/// All rules leaving a stage
pub fn rules_from(stage: WorkflowStage) -> impl Iterator<Item = &'static TransitionRule> {
    RULES.iter().filter(move |rule| rule.from == Some(stage))
}

/// Stages whose queue a role works from (owner-only rules excluded)
pub fn queue_stages(role: Role) -> Vec<WorkflowStage> {
    let mut stages: Vec<WorkflowStage> = RULES
        .iter()
        .filter(|rule| !rule.owner_only && rule.permits(role))
        .filter_map(|rule| rule.from)
        .collect();
    stages.sort();
    stages.dedup();
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rules_are_unique_per_stage_and_action() {
        let mut seen = HashSet::new();
        for rule in RULES {
            assert!(
                seen.insert((rule.from, rule.action)),
                "duplicate rule for {:?} {:?}",
                rule.from,
                rule.action
            );
        }
    }

    #[test]
    fn test_terminal_stages_have_no_exits() {
        assert_eq!(rules_from(WorkflowStage::Completed).count(), 0);
        assert_eq!(rules_from(WorkflowStage::Rejected).count(), 0);
    }

    #[test]
    fn test_reject_and_return_require_notes() {
        for rule in RULES {
            let needs = matches!(
                rule.action,
                LetterAction::Reject | LetterAction::ReturnForRevision
            );
            assert_eq!(rule.requires_notes, needs, "{:?}", rule.action);
        }
    }

    #[test]
    fn test_find_rule() {
        let rule = find_rule(Some(WorkflowStage::InitialReview), LetterAction::Forward).unwrap();
        assert_eq!(rule.to, WorkflowStage::Wd1Approval);
        assert!(rule.permits(Role::AdminUmum));
        assert!(!rule.permits(Role::Wd1));

        assert!(find_rule(Some(WorkflowStage::InitialReview), LetterAction::Approve).is_none());
        assert!(find_rule(None, LetterAction::Submit).is_some());
    }

    #[test]
    fn test_queue_stages() {
        assert_eq!(
            queue_stages(Role::AdminUmum),
            vec![WorkflowStage::InitialReview]
        );
        assert_eq!(queue_stages(Role::Wd1), vec![WorkflowStage::Wd1Approval]);
        assert_eq!(queue_stages(Role::Dean), vec![WorkflowStage::Wd1Approval]);
        assert!(queue_stages(Role::Student).is_empty());
        assert!(queue_stages(Role::FinanceAdmin).is_empty());
    }
}
