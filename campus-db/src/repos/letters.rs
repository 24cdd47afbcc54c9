//! Repository for letter requests
//!
//! Every write here also appends exactly one workflow history row inside the
//! same transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::history;
use crate::models::{
    decode_opt_time, decode_time, encode_time, LetterRequestRecord, WorkflowHistoryRecord,
};
use crate::{Database, Error, Result};

const LETTER_COLUMNS: &str = "id, letter_type, title, purpose, status, workflow_stage, student_id,
    assigned_to, forwarded_by, forwarded_at, wd1_approved_by, wd1_approved_at,
    wd1_approval_notes, request_date, updated_at";

/// Repository for managing letter request records
pub struct LetterRequestRepository<'db> {
    db: &'db Database,
}

impl<'db> LetterRequestRepository<'db> {
    /// Create a new repository instance
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Insert a new request together with its first history row
    ///
    /// The history row's `letter_request_id` is replaced with the new ID.
    pub fn insert_with_history(
        &self,
        record: &LetterRequestRecord,
        entry: &WorkflowHistoryRecord,
    ) -> Result<i64> {
        self.db.in_transaction(|conn| {
            conn.execute(
                "INSERT INTO letter_requests (
                    letter_type, title, purpose, status, workflow_stage, student_id,
                    assigned_to, forwarded_by, forwarded_at, wd1_approved_by, wd1_approved_at,
                    wd1_approval_notes, request_date, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    record.letter_type,
                    record.title,
                    record.purpose,
                    record.status,
                    record.workflow_stage,
                    record.student_id,
                    record.assigned_to,
                    record.forwarded_by,
                    record.forwarded_at.as_ref().map(encode_time),
                    record.wd1_approved_by,
                    record.wd1_approved_at.as_ref().map(encode_time),
                    record.wd1_approval_notes,
                    encode_time(&record.request_date),
                    encode_time(&record.updated_at),
                ],
            )?;

            let id = conn.last_insert_rowid();
            let entry = WorkflowHistoryRecord {
                letter_request_id: id,
                ..entry.clone()
            };
            history::append(conn, &entry)?;

            Ok(id)
        })
    }

    /// Write a transitioned request and its history row atomically
    ///
    /// The update only applies if the stored row is still the version the
    /// caller loaded: same stage and same `updated_at`. Otherwise nothing is
    /// written and [`Error::Conflict`] is returned, even if the request has
    /// since left the stage and come back to it.
    pub fn apply_transition(
        &self,
        record: &LetterRequestRecord,
        expected_stage: &str,
        expected_updated_at: &DateTime<Utc>,
        entry: &WorkflowHistoryRecord,
    ) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| Error::InvalidData("Cannot update letter request without ID".to_string()))?;

        if entry.letter_request_id != id {
            return Err(Error::InvalidData(format!(
                "History row targets request {} but update targets {}",
                entry.letter_request_id, id
            )));
        }

        self.db.in_transaction(|conn| {
            let affected = conn.execute(
                "UPDATE letter_requests SET
                    status = ?1,
                    workflow_stage = ?2,
                    assigned_to = ?3,
                    forwarded_by = ?4,
                    forwarded_at = ?5,
                    wd1_approved_by = ?6,
                    wd1_approved_at = ?7,
                    wd1_approval_notes = ?8,
                    updated_at = ?9
                 WHERE id = ?10 AND workflow_stage = ?11 AND updated_at = ?12",
                params![
                    record.status,
                    record.workflow_stage,
                    record.assigned_to,
                    record.forwarded_by,
                    record.forwarded_at.as_ref().map(encode_time),
                    record.wd1_approved_by,
                    record.wd1_approved_at.as_ref().map(encode_time),
                    record.wd1_approval_notes,
                    encode_time(&record.updated_at),
                    id,
                    expected_stage,
                    encode_time(expected_updated_at),
                ],
            )?;

            if affected == 0 {
                let exists: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM letter_requests WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                if exists == 0 {
                    return Err(Error::NotFound(format!(
                        "Letter request with id {} not found",
                        id
                    )));
                }
                return Err(Error::Conflict(format!(
                    "Letter request {} changed since it was loaded in stage {}",
                    id, expected_stage
                )));
            }

            history::append(conn, entry)?;
            Ok(())
        })
    }

    /// Find a request by ID
    pub fn find_by_id(&self, id: i64) -> Result<LetterRequestRecord> {
        let conn = self.db.connection();
        conn.query_row(
            &format!("SELECT {} FROM letter_requests WHERE id = ?1", LETTER_COLUMNS),
            params![id],
            Self::map_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Letter request with id {} not found", id))
            }
            _ => Error::Sqlite(e),
        })
    }

    /// All requests submitted by a student, newest first
    pub fn find_by_student(&self, student_id: i64) -> Result<Vec<LetterRequestRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM letter_requests
             WHERE student_id = ?1
             ORDER BY request_date DESC, id DESC",
            LETTER_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![student_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// All requests currently in a stage, oldest first (queue order)
    pub fn find_by_stage(&self, stage: &str) -> Result<Vec<LetterRequestRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM letter_requests
             WHERE workflow_stage = ?1
             ORDER BY request_date ASC, id ASC",
            LETTER_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![stage], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// All requests (with optional limit), newest first
    pub fn find_all(&self, limit: Option<usize>) -> Result<Vec<LetterRequestRecord>> {
        let conn = self.db.connection();

        let query = match limit {
            Some(limit) => format!(
                "SELECT {} FROM letter_requests ORDER BY request_date DESC, id DESC LIMIT {}",
                LETTER_COLUMNS, limit
            ),
            None => format!(
                "SELECT {} FROM letter_requests ORDER BY request_date DESC, id DESC",
                LETTER_COLUMNS
            ),
        };

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Count requests grouped by workflow stage
    pub fn count_by_stage(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT workflow_stage, COUNT(*) FROM letter_requests
             GROUP BY workflow_stage
             ORDER BY workflow_stage ASC",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn map_row(row: &Row) -> rusqlite::Result<LetterRequestRecord> {
        let forwarded_at: Option<String> = row.get(9)?;
        let wd1_approved_at: Option<String> = row.get(11)?;
        let request_date: String = row.get(13)?;
        let updated_at: String = row.get(14)?;

        Ok(LetterRequestRecord {
            id: Some(row.get(0)?),
            letter_type: row.get(1)?,
            title: row.get(2)?,
            purpose: row.get(3)?,
            status: row.get(4)?,
            workflow_stage: row.get(5)?,
            student_id: row.get(6)?,
            assigned_to: row.get(7)?,
            forwarded_by: row.get(8)?,
            forwarded_at: decode_opt_time(9, forwarded_at)?,
            wd1_approved_by: row.get(10)?,
            wd1_approved_at: decode_opt_time(11, wd1_approved_at)?,
            wd1_approval_notes: row.get(12)?,
            request_date: decode_time(13, &request_date)?,
            updated_at: decode_time(14, &updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::repos::{UserRepository, WorkflowHistoryRepository};

    struct Fixture {
        db: Database,
        student: i64,
        reviewer: i64,
    }

    fn setup() -> Fixture {
        let db = Database::in_memory().unwrap();
        let users = UserRepository::new(&db);
        let student = users
            .insert(&UserRecord::new("Siti", "siti@example.ac.id", "student"))
            .unwrap();
        let reviewer = users
            .insert(&UserRecord::new("Budi", "budi@example.ac.id", "admin_umum"))
            .unwrap();
        Fixture {
            db,
            student,
            reviewer,
        }
    }

    fn new_record(student_id: i64, title: &str) -> LetterRequestRecord {
        let now = Utc::now();
        LetterRequestRecord {
            id: None,
            letter_type: "active_student".to_string(),
            title: title.to_string(),
            purpose: Some("Scholarship".to_string()),
            status: "pending".to_string(),
            workflow_stage: "initial_review".to_string(),
            student_id,
            assigned_to: None,
            forwarded_by: None,
            forwarded_at: None,
            wd1_approved_by: None,
            wd1_approved_at: None,
            wd1_approval_notes: None,
            request_date: now,
            updated_at: now,
        }
    }

    fn submit(fx: &Fixture, title: &str) -> i64 {
        let record = new_record(fx.student, title);
        let entry = WorkflowHistoryRecord::new(
            0,
            "submitted",
            fx.student,
            "student",
            None,
            record.request_date,
        );
        LetterRequestRepository::new(&fx.db)
            .insert_with_history(&record, &entry)
            .unwrap()
    }

    #[test]
    fn test_insert_with_history() {
        let fx = setup();
        let id = submit(&fx, "Surat aktif");

        let repo = LetterRequestRepository::new(&fx.db);
        let stored = repo.find_by_id(id).unwrap();
        assert_eq!(stored.title, "Surat aktif");
        assert_eq!(stored.workflow_stage, "initial_review");

        let history = WorkflowHistoryRepository::new(&fx.db)
            .find_by_request(id)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].letter_request_id, id);
        assert_eq!(history[0].action, "submitted");
    }

    #[test]
    fn test_apply_transition_writes_row_and_history() {
        let fx = setup();
        let id = submit(&fx, "Surat aktif");
        let repo = LetterRequestRepository::new(&fx.db);

        let now = Utc::now();
        let mut record = repo.find_by_id(id).unwrap();
        let loaded_at = record.updated_at;
        record.workflow_stage = "wd1_approval".to_string();
        record.status = "in_review".to_string();
        record.forwarded_by = Some(fx.reviewer);
        record.forwarded_at = Some(now);
        record.updated_at = now;

        let entry = WorkflowHistoryRecord::new(id, "forwarded", fx.reviewer, "admin_umum", None, now);
        repo.apply_transition(&record, "initial_review", &loaded_at, &entry)
            .unwrap();

        let stored = repo.find_by_id(id).unwrap();
        assert_eq!(stored.workflow_stage, "wd1_approval");
        assert_eq!(stored.forwarded_by, Some(fx.reviewer));
        assert_eq!(stored.forwarded_at, Some(now));

        let history = WorkflowHistoryRepository::new(&fx.db);
        assert_eq!(history.find_by_request(id).unwrap().len(), 2);
    }

    #[test]
    fn test_apply_transition_stage_guard() {
        let fx = setup();
        let id = submit(&fx, "Surat aktif");
        let repo = LetterRequestRepository::new(&fx.db);

        let now = Utc::now();
        let mut record = repo.find_by_id(id).unwrap();
        let loaded_at = record.updated_at;
        record.workflow_stage = "completed".to_string();
        record.status = "approved".to_string();

        let entry = WorkflowHistoryRecord::new(id, "approved", fx.reviewer, "wd1", None, now);
        let result = repo.apply_transition(&record, "wd1_approval", &loaded_at, &entry);
        assert!(matches!(result, Err(Error::Conflict(_))));

        // Nothing was written
        let stored = repo.find_by_id(id).unwrap();
        assert_eq!(stored.workflow_stage, "initial_review");
        let history = WorkflowHistoryRepository::new(&fx.db);
        assert_eq!(history.find_by_request(id).unwrap().len(), 1);
    }

    /// Move the stored request to `stage`, as another actor would
    fn move_to(fx: &Fixture, id: i64, stage: &str, status: &str, action: &str, at: DateTime<Utc>) {
        let repo = LetterRequestRepository::new(&fx.db);
        let mut record = repo.find_by_id(id).unwrap();
        let (from, loaded_at) = (record.workflow_stage.clone(), record.updated_at);
        record.workflow_stage = stage.to_string();
        record.status = status.to_string();
        record.updated_at = at;
        let entry = WorkflowHistoryRecord::new(id, action, fx.reviewer, "admin_umum", None, at);
        repo.apply_transition(&record, &from, &loaded_at, &entry)
            .unwrap();
    }

    #[test]
    fn test_apply_transition_rejects_stale_row_back_in_same_stage() {
        let fx = setup();
        let id = submit(&fx, "Surat aktif");
        let repo = LetterRequestRepository::new(&fx.db);

        let stale = repo.find_by_id(id).unwrap();
        let start = stale.updated_at;
        move_to(
            &fx,
            id,
            "revision_requested",
            "revision_requested",
            "returned_for_revision",
            start + chrono::Duration::seconds(1),
        );
        move_to(
            &fx,
            id,
            "initial_review",
            "pending",
            "resubmitted",
            start + chrono::Duration::seconds(2),
        );

        let mut forward = stale.clone();
        forward.workflow_stage = "wd1_approval".to_string();
        forward.status = "in_review".to_string();
        forward.updated_at = start + chrono::Duration::milliseconds(500);
        let entry = WorkflowHistoryRecord::new(
            id,
            "forwarded",
            fx.reviewer,
            "admin_umum",
            None,
            forward.updated_at,
        );
        let result = repo.apply_transition(&forward, "initial_review", &start, &entry);
        assert!(matches!(result, Err(Error::Conflict(_))));

        let stored = repo.find_by_id(id).unwrap();
        assert_eq!(stored.workflow_stage, "initial_review");
        assert_eq!(stored.updated_at, start + chrono::Duration::seconds(2));
        let history = WorkflowHistoryRepository::new(&fx.db);
        assert_eq!(history.find_by_request(id).unwrap().len(), 3);
    }

    #[test]
    fn test_apply_transition_missing_request() {
        let fx = setup();
        let repo = LetterRequestRepository::new(&fx.db);

        let mut record = new_record(fx.student, "Ghost");
        record.id = Some(99);
        let entry =
            WorkflowHistoryRecord::new(99, "forwarded", fx.reviewer, "admin_umum", None, Utc::now());

        let result =
            repo.apply_transition(&record, "initial_review", &record.updated_at, &entry);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_apply_transition_rejects_mismatched_history() {
        let fx = setup();
        let id = submit(&fx, "Surat aktif");
        let repo = LetterRequestRepository::new(&fx.db);

        let record = repo.find_by_id(id).unwrap();
        let entry = WorkflowHistoryRecord::new(
            id + 1,
            "forwarded",
            fx.reviewer,
            "admin_umum",
            None,
            Utc::now(),
        );
        let result =
            repo.apply_transition(&record, "initial_review", &record.updated_at, &entry);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_find_by_student_stage_and_counts() {
        let fx = setup();
        submit(&fx, "One");
        submit(&fx, "Two");
        let third = submit(&fx, "Three");

        let repo = LetterRequestRepository::new(&fx.db);
        let mut record = repo.find_by_id(third).unwrap();
        let loaded_at = record.updated_at;
        record.workflow_stage = "rejected".to_string();
        record.status = "rejected".to_string();
        let entry = WorkflowHistoryRecord::new(
            third,
            "rejected",
            fx.reviewer,
            "admin_umum",
            Some("Incomplete".to_string()),
            Utc::now(),
        );
        repo.apply_transition(&record, "initial_review", &loaded_at, &entry)
            .unwrap();

        assert_eq!(repo.find_by_student(fx.student).unwrap().len(), 3);
        assert_eq!(repo.find_by_stage("initial_review").unwrap().len(), 2);
        assert_eq!(repo.find_all(Some(2)).unwrap().len(), 2);

        let counts = repo.count_by_stage().unwrap();
        assert_eq!(
            counts,
            vec![
                ("initial_review".to_string(), 2),
                ("rejected".to_string(), 1)
            ]
        );
    }
}
