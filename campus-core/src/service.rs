//! Letter request service
//!
//! Binds the workflow engine to the database. Callers identify themselves by
//! user ID; roles always come from the user directory.

use chrono::{DateTime, Utc};
use serde::Serialize;

use campus_db::{
    Database, LetterRequestRecord, LetterRequestRepository, UserRecord, UserRepository,
    WorkflowHistoryRecord, WorkflowHistoryRepository,
};

use crate::dashboard::{in_inbox, DashboardStats};
use crate::letter::{normalize_title, LetterRequest, LetterType};
use crate::role::{Actor, Role};
use crate::workflow::{
    self, FieldMismatch, HistoryEntry, LetterAction, LetterState, LetterWorkflow, TransitionResult,
    WorkflowStage,
};
use crate::{Error, Result};

/// A registered portal user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// This user as a workflow actor
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// User registration and lookup
pub struct UserDirectory<'db> {
    users: UserRepository<'db>,
}

impl<'db> UserDirectory<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    /// Register a new user
    pub fn register(&self, name: &str, email: &str, role: Role) -> Result<User> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::InvalidInput("Name must not be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(Error::InvalidInput(format!("Invalid email: {}", email)));
        }
        if self.users.find_by_email(&email)?.is_some() {
            return Err(Error::InvalidInput(format!(
                "Email {} is already registered",
                email
            )));
        }

        let mut record = UserRecord::new(name, email, role.as_str());
        record.id = Some(self.users.insert(&record)?);

        tracing::info!(id = ?record.id, role = %role, "User registered");
        to_user(record)
    }

    /// Look up a user
    pub fn get(&self, id: i64) -> Result<User> {
        to_user(self.users.find_by_id(id)?)
    }

    /// Look up a user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users
            .find_by_email(&email.trim().to_lowercase())?
            .map(to_user)
            .transpose()
    }

    /// All users
    pub fn list(&self) -> Result<Vec<User>> {
        self.users.find_all()?.into_iter().map(to_user).collect()
    }

    /// Users holding a role
    pub fn with_role(&self, role: Role) -> Result<Vec<User>> {
        self.users
            .find_by_role(role.as_str())?
            .into_iter()
            .map(to_user)
            .collect()
    }

    /// Resolve a user ID to an actor
    pub fn actor(&self, id: i64) -> Result<Actor> {
        Ok(self.get(id)?.actor())
    }
}

/// Outcome of checking one request against its history
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub request_id: i64,
    /// Fields whose stored value differs from the replayed value
    pub mismatches: Vec<FieldMismatch>,
    /// Set when the history could not be replayed at all
    pub error: Option<String>,
}

impl VerifyReport {
    /// Whether the row and its history agree
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty() && self.error.is_none()
    }
}

/// Letter request operations
pub struct LetterService<'db> {
    users: UserDirectory<'db>,
    letters: LetterRequestRepository<'db>,
    history: WorkflowHistoryRepository<'db>,
}

impl<'db> LetterService<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            users: UserDirectory::new(db),
            letters: LetterRequestRepository::new(db),
            history: WorkflowHistoryRepository::new(db),
        }
    }

    /// The user directory this service resolves actors from
    pub fn users(&self) -> &UserDirectory<'db> {
        &self.users
    }

    /// Submit a new letter request
    pub fn submit(
        &self,
        actor_id: i64,
        letter_type: LetterType,
        title: &str,
        purpose: Option<&str>,
    ) -> Result<LetterRequest> {
        let actor = self.users.actor(actor_id)?;
        let title = normalize_title(title)?;
        let purpose = workflow::normalize_notes(purpose);
        let now = Utc::now();

        let workflow = LetterWorkflow::submit(&actor, None, now)?;
        let (state, entries) = workflow.into_parts();
        let entry = entries
            .first()
            .ok_or_else(|| Error::Replay("Submission was not recorded".to_string()))?;

        let mut request = LetterRequest {
            id: 0,
            letter_type,
            title,
            purpose,
            request_date: now,
            state,
        };
        request.id = self
            .letters
            .insert_with_history(&to_record(&request, None), &to_history_record(0, entry))?;

        tracing::info!(id = request.id, letter_type = %letter_type, "Letter request created");
        Ok(request)
    }

    /// Forward a request for final approval, optionally to a specific approver
    pub fn forward(
        &self,
        actor_id: i64,
        id: i64,
        assignee: Option<i64>,
        notes: Option<&str>,
    ) -> Result<LetterRequest> {
        if let Some(assignee) = assignee {
            let user = self.users.get(assignee)?;
            if !matches!(user.role, Role::Wd1 | Role::Dean) {
                return Err(Error::InvalidInput(format!(
                    "Cannot assign to user {} with role {}; requires wd1 or dean",
                    assignee, user.role
                )));
            }
        }
        self.transition(actor_id, id, LetterAction::Forward, notes, assignee)
    }

    /// Give final approval
    pub fn approve(&self, actor_id: i64, id: i64, notes: Option<&str>) -> Result<LetterRequest> {
        self.transition(actor_id, id, LetterAction::Approve, notes, None)
    }

    /// Reject a request with a reason
    pub fn reject(&self, actor_id: i64, id: i64, reason: &str) -> Result<LetterRequest> {
        self.transition(actor_id, id, LetterAction::Reject, Some(reason), None)
    }

    /// Send a request back to the student
    pub fn return_for_revision(&self, actor_id: i64, id: i64, notes: &str) -> Result<LetterRequest> {
        self.transition(
            actor_id,
            id,
            LetterAction::ReturnForRevision,
            Some(notes),
            None,
        )
    }

    /// Resubmit a revised request
    pub fn resubmit(&self, actor_id: i64, id: i64, notes: Option<&str>) -> Result<LetterRequest> {
        self.transition(actor_id, id, LetterAction::Resubmit, notes, None)
    }

    fn transition(
        &self,
        actor_id: i64,
        id: i64,
        action: LetterAction,
        notes: Option<&str>,
        assignee: Option<i64>,
    ) -> Result<LetterRequest> {
        let actor = self.users.actor(actor_id)?;
        let request = self.get(id)?;
        self.apply(request, &actor, action, notes, assignee)
    }

    /// Apply an action to a request as it was loaded
    ///
    /// Fails with a database conflict if the stored row has changed since.
    fn apply(
        &self,
        request: LetterRequest,
        actor: &Actor,
        action: LetterAction,
        notes: Option<&str>,
        assignee: Option<i64>,
    ) -> Result<LetterRequest> {
        let id = request.id;
        assignment_check(&request.state, actor).into_result()?;

        let expected_stage = request.state.stage;
        let loaded_at = request.state.updated_at;
        // Strictly after the previous transition so `updated_at` identifies the row version
        let now = Utc::now().max(loaded_at + chrono::Duration::nanoseconds(1));

        let mut workflow = LetterWorkflow::from_state(request.state.clone());
        let entry = workflow.apply(actor, action, notes, now)?.clone();
        if assignee.is_some() {
            workflow.assign(assignee)?;
        }

        let updated = LetterRequest {
            state: workflow.state().clone(),
            ..request
        };
        self.letters.apply_transition(
            &to_record(&updated, Some(id)),
            expected_stage.as_str(),
            &loaded_at,
            &to_history_record(id, &entry),
        )?;

        Ok(updated)
    }

    /// Load a request
    pub fn get(&self, id: i64) -> Result<LetterRequest> {
        to_request(self.letters.find_by_id(id)?)
    }

    /// The audit trail of a request, oldest first
    pub fn history(&self, id: i64) -> Result<Vec<HistoryEntry>> {
        self.letters.find_by_id(id)?;
        self.history
            .find_by_request(id)?
            .into_iter()
            .map(to_entry)
            .collect()
    }

    /// Actions the user may take on a request right now
    pub fn available_actions(&self, actor_id: i64, id: i64) -> Result<Vec<LetterAction>> {
        let actor = self.users.actor(actor_id)?;
        let request = self.get(id)?;
        if assignment_check(&request.state, &actor).is_blocked() {
            return Ok(Vec::new());
        }
        Ok(LetterWorkflow::from_state(request.state).available_actions(&actor))
    }

    /// Preview whether an action would be allowed, without changing anything
    ///
    /// `id` is `None` to preview a new submission.
    pub fn check(
        &self,
        actor_id: i64,
        id: Option<i64>,
        action: LetterAction,
        notes: Option<&str>,
    ) -> Result<TransitionResult> {
        let actor = self.users.actor(actor_id)?;
        let Some(id) = id else {
            return Ok(workflow::check(None, &actor, action, notes));
        };

        let request = self.get(id)?;
        let result = workflow::check(Some(&request.state), &actor, action, notes);
        if result.is_blocked() {
            return Ok(result);
        }
        Ok(assignment_check(&request.state, &actor))
    }

    /// A student's own requests, newest first
    pub fn list_for_student(&self, student_id: i64) -> Result<Vec<LetterRequest>> {
        self.letters
            .find_by_student(student_id)?
            .into_iter()
            .map(to_request)
            .collect()
    }

    /// All requests, newest first
    pub fn list_all(&self, limit: Option<usize>) -> Result<Vec<LetterRequest>> {
        self.letters
            .find_all(limit)?
            .into_iter()
            .map(to_request)
            .collect()
    }

    /// Requests waiting for the user to act, oldest first within each stage
    pub fn inbox(&self, actor_id: i64) -> Result<Vec<LetterRequest>> {
        let actor = self.users.actor(actor_id)?;

        let candidates = if actor.role == Role::Student {
            let mut own = self.list_for_student(actor.id)?;
            own.reverse();
            own
        } else {
            let mut queued = Vec::new();
            for stage in workflow::queue_stages(actor.role) {
                for record in self.letters.find_by_stage(stage.as_str())? {
                    queued.push(to_request(record)?);
                }
            }
            queued
        };

        Ok(candidates
            .into_iter()
            .filter(|request| in_inbox(&actor, &request.state))
            .collect())
    }

    /// Request counts per stage
    pub fn stats(&self) -> Result<DashboardStats> {
        let counts = self.letters.count_by_stage()?;
        DashboardStats::from_counts(counts.iter().map(|(stage, n)| (stage.as_str(), *n)))
    }

    /// Replay a request's history and compare it with the stored row
    pub fn verify(&self, id: i64) -> Result<Vec<FieldMismatch>> {
        let request = self.get(id)?;
        let entries = self.history(id)?;
        workflow::verify(&request.state, &entries)
    }

    /// Verify every request
    pub fn verify_all(&self) -> Result<Vec<VerifyReport>> {
        let mut reports = Vec::new();
        for record in self.letters.find_all(None)? {
            let Some(request_id) = record.id else {
                continue;
            };
            let report = match self.verify(request_id) {
                Ok(mismatches) => VerifyReport {
                    request_id,
                    mismatches,
                    error: None,
                },
                Err(e @ (Error::Replay(_) | Error::InvalidInput(_))) => VerifyReport {
                    request_id,
                    mismatches: Vec::new(),
                    error: Some(e.to_string()),
                },
                Err(e) => return Err(e),
            };
            if !report.is_consistent() {
                tracing::warn!(request_id, "Letter request diverges from its history");
            }
            reports.push(report);
        }
        reports.sort_by_key(|r| r.request_id);
        Ok(reports)
    }
}

/// Requests assigned to a specific approver may only be acted on by them
fn assignment_check(state: &LetterState, actor: &Actor) -> TransitionResult {
    match state.assigned_to {
        Some(assignee) if state.stage == WorkflowStage::Wd1Approval && assignee != actor.id => {
            TransitionResult::Blocked {
                reason: format!("Request is assigned to user {}", assignee),
                suggestion: format!("Ask user {} to act on it", assignee),
            }
        }
        _ => TransitionResult::Allowed,
    }
}

fn to_user(record: UserRecord) -> Result<User> {
    Ok(User {
        id: stored_id(record.id, "user")?,
        role: record.role.parse()?,
        name: record.name,
        email: record.email,
        created_at: record.created_at,
    })
}

fn to_request(record: LetterRequestRecord) -> Result<LetterRequest> {
    Ok(LetterRequest {
        id: stored_id(record.id, "letter request")?,
        letter_type: record.letter_type.parse()?,
        title: record.title,
        purpose: record.purpose,
        request_date: record.request_date,
        state: LetterState {
            stage: record.workflow_stage.parse()?,
            status: record.status.parse()?,
            student_id: record.student_id,
            assigned_to: record.assigned_to,
            forwarded_by: record.forwarded_by,
            forwarded_at: record.forwarded_at,
            wd1_approved_by: record.wd1_approved_by,
            wd1_approved_at: record.wd1_approved_at,
            wd1_approval_notes: record.wd1_approval_notes,
            updated_at: record.updated_at,
        },
    })
}

fn to_record(request: &LetterRequest, id: Option<i64>) -> LetterRequestRecord {
    let state = &request.state;
    LetterRequestRecord {
        id,
        letter_type: request.letter_type.as_str().to_string(),
        title: request.title.clone(),
        purpose: request.purpose.clone(),
        status: state.status.as_str().to_string(),
        workflow_stage: state.stage.as_str().to_string(),
        student_id: state.student_id,
        assigned_to: state.assigned_to,
        forwarded_by: state.forwarded_by,
        forwarded_at: state.forwarded_at,
        wd1_approved_by: state.wd1_approved_by,
        wd1_approved_at: state.wd1_approved_at,
        wd1_approval_notes: state.wd1_approval_notes.clone(),
        request_date: request.request_date,
        updated_at: state.updated_at,
    }
}

fn to_entry(record: WorkflowHistoryRecord) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        action: record.action.parse()?,
        actor_id: record.actor_id,
        actor_role: record.actor_role.parse()?,
        notes: record.notes,
        created_at: record.created_at,
    })
}

fn to_history_record(request_id: i64, entry: &HistoryEntry) -> WorkflowHistoryRecord {
    WorkflowHistoryRecord::new(
        request_id,
        entry.action.as_str(),
        entry.actor_id,
        entry.actor_role.as_str(),
        entry.notes.clone(),
        entry.created_at,
    )
}

fn stored_id(id: Option<i64>, what: &str) -> Result<i64> {
    id.ok_or_else(|| {
        campus_db::Error::InvalidData(format!("Stored {} has no ID", what)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        db: Database,
        student: i64,
        other_student: i64,
        reviewer: i64,
        wd1: i64,
        dean: i64,
    }

    fn fixture() -> Fixture {
        let db = Database::in_memory().unwrap();
        let (student, other_student, reviewer, wd1, dean) = {
            let users = UserDirectory::new(&db);
            (
                users.register("Siti", "siti@campus.ac.id", Role::Student).unwrap().id,
                users.register("Budi", "budi@campus.ac.id", Role::Student).unwrap().id,
                users.register("Rina", "rina@campus.ac.id", Role::AdminUmum).unwrap().id,
                users.register("Dr. Hadi", "hadi@campus.ac.id", Role::Wd1).unwrap().id,
                users.register("Prof. Dewi", "dewi@campus.ac.id", Role::Dean).unwrap().id,
            )
        };
        Fixture {
            db,
            student,
            other_student,
            reviewer,
            wd1,
            dean,
        }
    }

    fn submit(f: &Fixture) -> LetterRequest {
        LetterService::new(&f.db)
            .submit(
                f.student,
                LetterType::ActiveStudent,
                "  Active student letter ",
                Some("Scholarship application"),
            )
            .unwrap()
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let f = fixture();
        let users = UserDirectory::new(&f.db);
        let err = users
            .register("Siti Again", "SITI@campus.ac.id", Role::Student)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(users.register("", "x@campus.ac.id", Role::Student).is_err());
        assert!(users.register("X", "not-an-email", Role::Student).is_err());
        assert_eq!(users.list().unwrap().len(), 5);
        assert_eq!(users.with_role(Role::Student).unwrap().len(), 2);
    }

    #[test]
    fn test_submit_creates_request_and_history() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        assert_eq!(request.title, "Active student letter");
        assert_eq!(request.state.stage, WorkflowStage::InitialReview);

        let stored = service.get(request.id).unwrap();
        assert_eq!(stored.state, request.state);
        assert_eq!(stored.purpose.as_deref(), Some("Scholarship application"));

        let history = service.history(request.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, LetterAction::Submit);
        assert_eq!(history[0].actor_id, f.student);
    }

    #[test]
    fn test_only_students_submit() {
        let f = fixture();
        let err = LetterService::new(&f.db)
            .submit(f.reviewer, LetterType::Transcript, "Transcript", None)
            .unwrap_err();
        assert!(matches!(err, Error::TransitionRefused { .. }));
    }

    #[test]
    fn test_full_approval_path() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        let forwarded = service.forward(f.reviewer, request.id, None, None).unwrap();
        assert_eq!(forwarded.state.stage, WorkflowStage::Wd1Approval);
        assert_eq!(forwarded.state.forwarded_by, Some(f.reviewer));

        let approved = service
            .approve(f.wd1, request.id, Some("Signed"))
            .unwrap();
        assert_eq!(approved.state.stage, WorkflowStage::Completed);
        assert_eq!(approved.state.wd1_approved_by, Some(f.wd1));
        assert_eq!(approved.state.wd1_approval_notes.as_deref(), Some("Signed"));

        let actions: Vec<_> = service
            .history(request.id)
            .unwrap()
            .iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                LetterAction::Submit,
                LetterAction::Forward,
                LetterAction::Approve
            ]
        );
        assert!(service.verify(request.id).unwrap().is_empty());
    }

    #[test]
    fn test_refused_transition_writes_nothing() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        let err = service.approve(f.wd1, request.id, None).unwrap_err();
        assert!(matches!(err, Error::TransitionRefused { .. }));
        assert!(service.reject(f.reviewer, request.id, "   ").is_err());

        assert_eq!(service.history(request.id).unwrap().len(), 1);
        assert_eq!(
            service.get(request.id).unwrap().state.stage,
            WorkflowStage::InitialReview
        );
    }

    #[test]
    fn test_revision_cycle() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        service.forward(f.reviewer, request.id, Some(f.wd1), None).unwrap();
        let returned = service
            .return_for_revision(f.wd1, request.id, "Attach KRS")
            .unwrap();
        assert_eq!(returned.state.stage, WorkflowStage::RevisionRequested);

        assert!(service.resubmit(f.other_student, request.id, None).is_err());

        let resubmitted = service.resubmit(f.student, request.id, None).unwrap();
        assert_eq!(resubmitted.state.stage, WorkflowStage::InitialReview);
        assert_eq!(resubmitted.state.forwarded_by, None);
        assert_eq!(resubmitted.state.assigned_to, None);

        assert!(service.verify(request.id).unwrap().is_empty());
    }

    #[test]
    fn test_stale_transition_conflicts() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);
        let reviewer = service.users().actor(f.reviewer).unwrap();

        let stale = service.get(request.id).unwrap();
        service
            .return_for_revision(f.reviewer, request.id, "Attach KRS")
            .unwrap();
        service.resubmit(f.student, request.id, None).unwrap();
        assert_eq!(
            service.get(request.id).unwrap().state.stage,
            stale.state.stage
        );

        let err = service
            .apply(stale, &reviewer, LetterAction::Forward, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Database(campus_db::Error::Conflict(_))
        ));

        assert_eq!(service.history(request.id).unwrap().len(), 3);
        assert_eq!(
            service.get(request.id).unwrap().state.stage,
            WorkflowStage::InitialReview
        );
        assert!(service.verify(request.id).unwrap().is_empty());

        service.forward(f.reviewer, request.id, None, None).unwrap();
        assert!(service.verify(request.id).unwrap().is_empty());
    }

    #[test]
    fn test_assignment_restricts_approver() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        let forwarded = service
            .forward(f.reviewer, request.id, Some(f.wd1), None)
            .unwrap();
        assert_eq!(forwarded.state.assigned_to, Some(f.wd1));

        assert!(service.approve(f.dean, request.id, None).is_err());
        assert!(service.available_actions(f.dean, request.id).unwrap().is_empty());
        assert!(service
            .check(f.dean, Some(request.id), LetterAction::Approve, None)
            .unwrap()
            .is_blocked());

        assert!(service.inbox(f.dean).unwrap().is_empty());
        assert_eq!(service.inbox(f.wd1).unwrap().len(), 1);

        service.approve(f.wd1, request.id, None).unwrap();
    }

    #[test]
    fn test_forward_assignee_must_be_approver() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        let err = service
            .forward(f.reviewer, request.id, Some(f.other_student), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(service.forward(f.reviewer, request.id, Some(9999), None).is_err());
        assert_eq!(service.history(request.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_actor_and_request() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        assert!(matches!(
            service.forward(4242, request.id, None, None),
            Err(Error::Database(campus_db::Error::NotFound(_)))
        ));
        assert!(matches!(
            service.forward(f.reviewer, 4242, None, None),
            Err(Error::Database(campus_db::Error::NotFound(_)))
        ));
        assert!(service.history(4242).is_err());
    }

    #[test]
    fn test_available_actions_and_check() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let request = submit(&f);

        assert_eq!(
            service.available_actions(f.reviewer, request.id).unwrap(),
            vec![
                LetterAction::Forward,
                LetterAction::Reject,
                LetterAction::ReturnForRevision
            ]
        );
        assert!(service
            .available_actions(f.student, request.id)
            .unwrap()
            .is_empty());

        assert!(service
            .check(f.student, None, LetterAction::Submit, None)
            .unwrap()
            .is_allowed());
        let blocked = service
            .check(f.reviewer, Some(request.id), LetterAction::Reject, None)
            .unwrap();
        assert!(blocked.blocking_reason().unwrap().contains("reason"));
    }

    #[test]
    fn test_inbox_and_listing() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let first = submit(&f);
        let second = submit(&f);
        service
            .return_for_revision(f.reviewer, second.id, "Wrong semester")
            .unwrap();

        let reviewer_inbox: Vec<_> = service
            .inbox(f.reviewer)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(reviewer_inbox, vec![first.id]);

        let student_inbox: Vec<_> = service
            .inbox(f.student)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(student_inbox, vec![second.id]);
        assert!(service.inbox(f.other_student).unwrap().is_empty());

        let listed: Vec<_> = service
            .list_for_student(f.student)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[test]
    fn test_stats() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let first = submit(&f);
        submit(&f);
        service.reject(f.reviewer, first.id, "Duplicate").unwrap();

        let stats = service.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count(WorkflowStage::InitialReview), 1);
        assert_eq!(stats.count(WorkflowStage::Rejected), 1);
        assert_eq!(stats.open(), 1);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let f = fixture();
        let service = LetterService::new(&f.db);
        let clean = submit(&f);
        let tampered = submit(&f);

        f.db.connection()
            .execute(
                "UPDATE letter_requests SET workflow_stage = 'completed', status = 'approved'
                 WHERE id = ?1",
                [tampered.id],
            )
            .unwrap();

        let reports = service.verify_all().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_consistent());
        assert_eq!(reports[0].request_id, clean.id);

        let fields: Vec<_> = reports[1].mismatches.iter().map(|m| m.field).collect();
        assert_eq!(fields, vec!["workflow_stage", "status"]);
    }
}
