//! History replay
//!
//! A request's history, ordered by time, is folded through the same state
//! machine that produced it. The result must equal the stored row; anything
//! else means the row or the log was modified outside the workflow.

use serde::Serialize;

use super::action::LetterAction;
use super::state::{HistoryEntry, LetterState, LetterWorkflow};
use crate::{Error, Result};

/// Rebuild a request's state from its history
///
/// Entries are ordered by `created_at`; entries with equal timestamps keep
/// their given order.
pub fn replay(entries: &[HistoryEntry]) -> Result<LetterState> {
    let mut ordered: Vec<&HistoryEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.created_at);

    let (first, rest) = ordered
        .split_first()
        .ok_or_else(|| Error::Replay("History is empty".to_string()))?;

    if first.action != LetterAction::Submit {
        return Err(Error::Replay(format!(
            "History starts with {} instead of {}",
            first.action,
            LetterAction::Submit
        )));
    }

    let mut workflow = LetterWorkflow::submit(&first.actor(), first.notes.as_deref(), first.created_at)
        .map_err(|e| Error::Replay(format!("Entry 0 ({}): {}", first.action, e)))?;

    for (index, entry) in rest.iter().enumerate() {
        workflow
            .apply(
                &entry.actor(),
                entry.action,
                entry.notes.as_deref(),
                entry.created_at,
            )
            .map_err(|e| Error::Replay(format!("Entry {} ({}): {}", index + 1, entry.action, e)))?;
    }

    Ok(workflow.into_parts().0)
}

/// A field whose stored value differs from the replayed value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    /// Field name
    pub field: &'static str,
    /// Value in the stored row
    pub stored: String,
    /// Value rebuilt from history
    pub replayed: String,
}

/// Compare a stored state with the state rebuilt from history
///
/// `assigned_to` is not part of the history log and is not compared.
pub fn diff(stored: &LetterState, replayed: &LetterState) -> Vec<FieldMismatch> {
    let mut mismatches = Vec::new();

    let mut compare = |field: &'static str, stored: String, replayed: String| {
        if stored != replayed {
            mismatches.push(FieldMismatch {
                field,
                stored,
                replayed,
            });
        }
    };

    compare(
        "workflow_stage",
        stored.stage.to_string(),
        replayed.stage.to_string(),
    );
    compare(
        "status",
        stored.status.to_string(),
        replayed.status.to_string(),
    );
    compare(
        "student_id",
        stored.student_id.to_string(),
        replayed.student_id.to_string(),
    );
    compare(
        "forwarded_by",
        format!("{:?}", stored.forwarded_by),
        format!("{:?}", replayed.forwarded_by),
    );
    compare(
        "forwarded_at",
        format!("{:?}", stored.forwarded_at),
        format!("{:?}", replayed.forwarded_at),
    );
    compare(
        "wd1_approved_by",
        format!("{:?}", stored.wd1_approved_by),
        format!("{:?}", replayed.wd1_approved_by),
    );
    compare(
        "wd1_approved_at",
        format!("{:?}", stored.wd1_approved_at),
        format!("{:?}", replayed.wd1_approved_at),
    );
    compare(
        "wd1_approval_notes",
        format!("{:?}", stored.wd1_approval_notes),
        format!("{:?}", replayed.wd1_approval_notes),
    );
    compare(
        "updated_at",
        stored.updated_at.to_rfc3339(),
        replayed.updated_at.to_rfc3339(),
    );

    mismatches
}

/// Replay `entries` and compare the result with `stored`
pub fn verify(stored: &LetterState, entries: &[HistoryEntry]) -> Result<Vec<FieldMismatch>> {
    let replayed = replay(entries)?;
    Ok(diff(stored, &replayed))
}
