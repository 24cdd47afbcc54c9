//! Repository for the append-only workflow history
//!
//! Rows are only ever written by [`LetterRequestRepository`] as part of the
//! same transaction that changes the request row. This repository is read-only.
//!
//! [`LetterRequestRepository`]: super::letters::LetterRequestRepository

use rusqlite::{params, Connection, Row};

use crate::models::{decode_time, encode_time, WorkflowHistoryRecord};
use crate::{Database, Result};

const HISTORY_COLUMNS: &str =
    "id, letter_request_id, action, actor_id, actor_role, notes, created_at";

/// Append a history row on an open connection (caller owns the transaction)
pub(crate) fn append(conn: &Connection, entry: &WorkflowHistoryRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO workflow_history (
            letter_request_id, action, actor_id, actor_role, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.letter_request_id,
            entry.action,
            entry.actor_id,
            entry.actor_role,
            entry.notes,
            encode_time(&entry.created_at),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Read access to workflow history rows
pub struct WorkflowHistoryRepository<'db> {
    db: &'db Database,
}

impl<'db> WorkflowHistoryRepository<'db> {
    /// Create a new repository instance
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// All history for a request, oldest first
    pub fn find_by_request(&self, letter_request_id: i64) -> Result<Vec<WorkflowHistoryRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM workflow_history
             WHERE letter_request_id = ?1
             ORDER BY created_at ASC, id ASC",
            HISTORY_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![letter_request_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn map_row(row: &Row) -> rusqlite::Result<WorkflowHistoryRecord> {
        let created_at: String = row.get(6)?;

        Ok(WorkflowHistoryRecord {
            id: Some(row.get(0)?),
            letter_request_id: row.get(1)?,
            action: row.get(2)?,
            actor_id: row.get(3)?,
            actor_role: row.get(4)?,
            notes: row.get(5)?,
            created_at: decode_time(6, &created_at)?,
        })
    }
}
