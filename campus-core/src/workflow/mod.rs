//! Letter request approval workflow
//!
//! A request moves `initial_review → wd1_approval → completed`, can be sent
//! back to the student (`revision_requested`) from either review stage, and
//! can be `rejected` from either review stage. Every transition is role
//! gated and recorded in an append-only history.

pub mod action;
pub mod replay;
pub mod rules;
pub mod stage;
pub mod state;
pub mod transitions;

pub use action::LetterAction;
pub use replay::{diff, replay, verify, FieldMismatch};
pub use rules::{find_rule, queue_stages, rules_from, TransitionRule, RULES};
pub use stage::{LetterStatus, WorkflowStage};
pub use state::{HistoryEntry, LetterState, LetterWorkflow};
pub use transitions::{check, normalize_notes, TransitionResult};
