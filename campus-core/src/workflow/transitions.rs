//! Transition validation for letter requests
//!
//! Validation never mutates anything; it answers whether an actor may take an
//! action right now and, if not, why.

use super::action::LetterAction;
use super::rules::{find_rule, rules_from, TransitionRule};
use super::state::LetterState;
use crate::role::{Actor, Role};
use crate::Error;

/// Result of checking a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition is allowed to proceed
    Allowed,
    /// Transition is blocked
    Blocked {
        /// Reason why the transition is blocked
        reason: String,
        /// Suggestion for how to proceed
        suggestion: String,
    },
}

impl TransitionResult {
    /// Check if the transition is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, TransitionResult::Allowed)
    }

    /// Check if the transition is blocked
    pub fn is_blocked(&self) -> bool {
        matches!(self, TransitionResult::Blocked { .. })
    }

    /// Get the blocking reason if blocked
    pub fn blocking_reason(&self) -> Option<&str> {
        match self {
            TransitionResult::Blocked { reason, .. } => Some(reason),
            TransitionResult::Allowed => None,
        }
    }

    /// Get the suggestion if blocked
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            TransitionResult::Blocked { suggestion, .. } => Some(suggestion),
            TransitionResult::Allowed => None,
        }
    }

    /// Convert a blocked result into an error
    pub fn into_result(self) -> crate::Result<()> {
        match self {
            TransitionResult::Allowed => Ok(()),
            TransitionResult::Blocked { reason, suggestion } => {
                Err(Error::TransitionRefused { reason, suggestion })
            }
        }
    }
}

/// Why [`resolve`] found no permitting rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Refusal {
    reason: String,
    suggestion: String,
}

impl Refusal {
    fn new(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }
}

impl From<Refusal> for TransitionResult {
    fn from(refusal: Refusal) -> Self {
        TransitionResult::Blocked {
            reason: refusal.reason,
            suggestion: refusal.suggestion,
        }
    }
}

impl From<Refusal> for Error {
    fn from(refusal: Refusal) -> Self {
        Error::TransitionRefused {
            reason: refusal.reason,
            suggestion: refusal.suggestion,
        }
    }
}

/// Trim notes, treating blank notes as absent
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Check whether `actor` may take `action` on a request in `state`
///
/// `state` is `None` for a request that does not exist yet.
pub fn check(
    state: Option<&LetterState>,
    actor: &Actor,
    action: LetterAction,
    notes: Option<&str>,
) -> TransitionResult {
    match resolve(state, actor, action, notes) {
        Ok(_) => TransitionResult::Allowed,
        Err(refusal) => refusal.into(),
    }
}

/// Find the rule that permits the transition, or explain why none does
pub(crate) fn resolve(
    state: Option<&LetterState>,
    actor: &Actor,
    action: LetterAction,
    notes: Option<&str>,
) -> Result<&'static TransitionRule, Refusal> {
    let from = state.map(|s| s.stage);

    if let Some(stage) = from {
        if stage.is_terminal() {
            return Err(Refusal::new(
                format!("Request is already {}", stage),
                "No further actions are possible on this request",
            ));
        }
    }

    let rule = match (from, find_rule(from, action)) {
        (_, Some(rule)) => rule,
        (None, None) => {
            return Err(Refusal::new(
                format!("Cannot {} a request that has not been submitted", action.verb()),
                "Submit the request first",
            ));
        }
        (Some(stage), None) => {
            let valid: Vec<&str> = rules_from(stage).map(|r| r.action.verb()).collect();
            return Err(Refusal::new(
                format!("Cannot {} a request in stage {}", action.verb(), stage),
                format!("Valid actions from {}: {}", stage, valid.join(", ")),
            ));
        }
    };

    if !rule.permits(actor.role) {
        let roles: Vec<&str> = rule.roles.iter().map(Role::as_str).collect();
        let reason = match from {
            Some(stage) => format!(
                "Role {} cannot {} requests in stage {}",
                actor.role,
                action.verb(),
                stage
            ),
            None => format!("Role {} cannot {} requests", actor.role, action.verb()),
        };
        return Err(Refusal::new(
            reason,
            format!("Requires one of: {}", roles.join(", ")),
        ));
    }

    if rule.owner_only {
        if let Some(state) = state {
            if state.student_id != actor.id {
                return Err(Refusal::new(
                    format!("Only the submitting student can {} this request", action.verb()),
                    format!("Request belongs to user {}", state.student_id),
                ));
            }
        }
    }

    if rule.requires_notes && normalize_notes(notes).is_none() {
        return Err(Refusal::new(
            format!("A reason is required to {} a request", action.verb()),
            "Provide notes explaining the decision",
        ));
    }

    Ok(rule)
}
