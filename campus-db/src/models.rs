//! Data models for database records

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Encode a timestamp as fixed-width RFC 3339 so text order matches time order
pub(crate) fn encode_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode a stored timestamp, reporting the failing column to rusqlite
pub(crate) fn decode_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Decode an optional stored timestamp
pub(crate) fn decode_opt_time(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|s| decode_time(idx, &s)).transpose()
}

/// A portal user (student, staff, or approver)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique identifier
    pub id: Option<i64>,

    /// Display name
    pub name: String,

    /// Login email, unique across users
    pub email: String,

    /// Role name (e.g., "student", "admin_umum", "wd1")
    pub role: String,

    /// When this user was created
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new user record
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            role: role.into(),
            created_at: Utc::now(),
        }
    }
}

/// A letter request row
///
/// Stage and status are stored as their wire names; the workflow engine owns
/// their meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterRequestRecord {
    /// Unique identifier
    pub id: Option<i64>,

    /// Letter type (e.g., "active_student")
    pub letter_type: String,

    /// Short title shown in lists
    pub title: String,

    /// Free-text purpose supplied by the student
    pub purpose: Option<String>,

    /// Status derived from the workflow stage
    pub status: String,

    /// Current workflow stage
    pub workflow_stage: String,

    /// Submitting student
    pub student_id: i64,

    /// Approver this request is assigned to, if any
    pub assigned_to: Option<i64>,

    /// Who forwarded the request to WD1 approval
    pub forwarded_by: Option<i64>,

    /// When it was forwarded
    pub forwarded_at: Option<DateTime<Utc>>,

    /// Who gave the final approval
    pub wd1_approved_by: Option<i64>,

    /// When the final approval happened
    pub wd1_approved_at: Option<DateTime<Utc>>,

    /// Notes attached to the final approval
    pub wd1_approval_notes: Option<String>,

    /// When the request was submitted
    pub request_date: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// One append-only audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowHistoryRecord {
    /// Unique identifier
    pub id: Option<i64>,

    /// The letter request this row belongs to
    pub letter_request_id: i64,

    /// Action name (e.g., "forwarded")
    pub action: String,

    /// Acting user
    pub actor_id: i64,

    /// The actor's role at the time of the action
    pub actor_role: String,

    /// Reason or notes given with the action
    pub notes: Option<String>,

    /// When the action happened
    pub created_at: DateTime<Utc>,
}

impl WorkflowHistoryRecord {
    /// Create a new history row for a request
    pub fn new(
        letter_request_id: i64,
        action: impl Into<String>,
        actor_id: i64,
        actor_role: impl Into<String>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            letter_request_id,
            action: action.into(),
            actor_id,
            actor_role: actor_role.into(),
            notes,
            created_at,
        }
    }
}
