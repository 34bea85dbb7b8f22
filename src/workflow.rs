//! Workflow engine: the mutating commands over the repository.
//!
//! Every command validates before it writes and is all-or-nothing: a denied
//! or invalid request leaves the database untouched. Status changes go
//! through `move_task`, which consults the authorizer and appends exactly
//! one activity entry per successful transition, mirrored into the flat
//! audit trail. Timestamps are supplied by the caller.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{authorize, Actor, DenyReason};
use crate::db::Database;
use crate::fields::{status_slug, Priority, Role, TaskStatus};
use crate::task::{
    ActivityEntry, Comment, DocumentMeta, Milestone, NewDocument, NewMilestone, NewTask, Task,
    TaskFieldUpdate,
};

/// Failure of an engine command. Reported to the caller; never a crash,
/// never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("{0}")]
    Denied(#[from] DenyReason),
    #[error("{0}")]
    Validation(String),
}

fn validation(msg: &str) -> WorkflowError {
    WorkflowError::Validation(msg.to_string())
}

/// Create a task. Client actors only; new tasks always start `Assigned`.
pub fn create_task(
    db: &mut Database,
    new: NewTask,
    actor: &Actor,
    now: i64,
) -> Result<u64, WorkflowError> {
    if actor.role != Role::Client {
        return Err(DenyReason::InsufficientRole.into());
    }
    let title = new.title.trim();
    if title.is_empty() {
        return Err(validation("task title cannot be empty"));
    }
    let id = db.next_task_id();
    db.tasks.push(Task {
        id,
        title: title.to_string(),
        description: new.description,
        status: TaskStatus::Assigned,
        assigned_to: new.assigned_to,
        priority: new.priority.unwrap_or(Priority::Medium),
        due: new.due,
        start: new.start,
        is_delayed: false,
        delay_reason: None,
        delay_noted_by: None,
        delay_noted_at: None,
        comments: vec![],
        documents: vec![],
        activity_log: vec![],
        created_at_utc: now,
        updated_at_utc: now,
    });
    info!(task = id, actor = %actor.id, "task created");
    Ok(id)
}

/// Update non-status fields of a task. Status has no representation in
/// `TaskFieldUpdate`, so this path cannot move a task through the pipeline.
pub fn update_task_fields(
    db: &mut Database,
    id: u64,
    changes: TaskFieldUpdate,
    now: i64,
) -> Result<(), WorkflowError> {
    let task = db.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
    if let Some(title) = changes.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(validation("task title cannot be empty"));
        }
        task.title = title;
    }
    if let Some(desc) = changes.description {
        task.description = Some(desc);
    }
    if changes.clear_assignee {
        task.assigned_to = None;
    } else if let Some(a) = changes.assigned_to {
        task.assigned_to = Some(a);
    }
    if let Some(p) = changes.priority {
        task.priority = p;
    }
    if changes.clear_due {
        task.due = None;
    } else if let Some(d) = changes.due {
        task.due = Some(d);
    }
    if changes.clear_start {
        task.start = None;
    } else if let Some(d) = changes.start {
        task.start = Some(d);
    }
    task.updated_at_utc = now;
    Ok(())
}

/// Move a task to `target` on behalf of `actor`.
///
/// Looks the task up, consults the authorizer against its current status,
/// and on approval sets the status and appends one activity entry to the
/// task's log and the flat audit trail. A denial performs no write at all.
pub fn move_task(
    db: &mut Database,
    id: u64,
    target: TaskStatus,
    actor: &Actor,
    now: i64,
) -> Result<(), WorkflowError> {
    let task = db.get(id).ok_or(WorkflowError::TaskNotFound(id))?;
    if let Err(reason) = authorize(actor, task, target) {
        warn!(task = id, actor = %actor.id, to = status_slug(target), %reason, "transition denied");
        return Err(reason.into());
    }

    let entry = ActivityEntry {
        id: db.next_audit_id(),
        task_id: id,
        action: format!("moved to {}", status_slug(target)),
        actor_id: actor.id.clone(),
        actor_name: actor.name.clone(),
        timestamp: now,
    };
    let task = db.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
    task.status = target;
    task.updated_at_utc = now;
    task.activity_log.push(entry.clone());
    db.audit.push(entry);
    info!(task = id, actor = %actor.id, to = status_slug(target), "task moved");
    Ok(())
}

/// Flag a task as delayed with a reason.
///
/// Open to the task's assignee regardless of role or current status; not
/// part of the status state machine. Delay notes do not append an activity
/// entry.
pub fn note_delay(
    db: &mut Database,
    id: u64,
    reason: &str,
    actor: &Actor,
    now: i64,
) -> Result<(), WorkflowError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(validation("delay reason cannot be empty"));
    }
    let task = db.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
    if task.assigned_to.as_deref() != Some(actor.id.as_str()) {
        return Err(DenyReason::NotAssignee.into());
    }
    task.is_delayed = true;
    task.delay_reason = Some(reason.to_string());
    task.delay_noted_by = Some(actor.name.clone());
    task.delay_noted_at = Some(now);
    task.updated_at_utc = now;
    info!(task = id, actor = %actor.id, "delay noted");
    Ok(())
}

/// Append a comment to a task. Blank comments are rejected before any write.
pub fn add_comment(
    db: &mut Database,
    id: u64,
    content: &str,
    actor: &Actor,
    now: i64,
) -> Result<u64, WorkflowError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(validation("comment cannot be empty"));
    }
    let task = db.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
    let comment_id = task.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
    task.comments.push(Comment {
        id: comment_id,
        author_id: actor.id.clone(),
        author_name: actor.name.clone(),
        content: content.to_string(),
        timestamp: now,
    });
    task.updated_at_utc = now;
    Ok(comment_id)
}

/// Record uploaded document metadata on a task. The file itself is not
/// stored anywhere.
pub fn add_document(
    db: &mut Database,
    id: u64,
    new: NewDocument,
    actor: &Actor,
    now: i64,
) -> Result<u64, WorkflowError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(validation("document name cannot be empty"));
    }
    let task = db.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
    let doc_id = task.documents.iter().map(|d| d.id).max().unwrap_or(0) + 1;
    task.documents.push(DocumentMeta {
        id: doc_id,
        name: name.to_string(),
        size: new.size,
        mime_type: new.mime_type,
        uploaded_by: actor.name.clone(),
        uploaded_at: now,
    });
    task.updated_at_utc = now;
    Ok(doc_id)
}

/// Create a schedule milestone. Client actors only.
pub fn add_milestone(
    db: &mut Database,
    new: NewMilestone,
    actor: &Actor,
    now: i64,
) -> Result<u64, WorkflowError> {
    if actor.role != Role::Client {
        return Err(DenyReason::InsufficientRole.into());
    }
    let title = new.title.trim();
    if title.is_empty() {
        return Err(validation("milestone title cannot be empty"));
    }
    let id = db.next_milestone_id();
    db.milestones.push(Milestone {
        id,
        title: title.to_string(),
        due: new.due,
        status: new.status,
        created_at_utc: now,
    });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    fn client() -> Actor {
        Actor { id: "c1".into(), name: "Site Manager".into(), role: Role::Client }
    }

    fn sub(id: &str) -> Actor {
        Actor { id: id.into(), name: format!("{id} crew"), role: Role::Subcontractor }
    }

    fn seeded(status: TaskStatus, assignee: &str) -> (Database, u64) {
        let mut db = Database::default();
        let id = create_task(
            &mut db,
            NewTask {
                title: "Install HVAC ducting".into(),
                assigned_to: Some(assignee.into()),
                priority: Some(Priority::High),
                ..Default::default()
            },
            &client(),
            100,
        )
        .unwrap();
        db.get_mut(id).unwrap().status = status;
        (db, id)
    }

    #[test]
    fn test_assignee_accepts_assigned_task() {
        let (mut db, id) = seeded(TaskStatus::Assigned, "acme");
        move_task(&mut db, id, TaskStatus::Accepted, &sub("acme"), 200).unwrap();

        let task = db.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Accepted);
        assert_eq!(task.activity_log.len(), 1);
        assert_eq!(task.activity_log[0].action, "moved to accepted");
        assert_eq!(task.activity_log[0].actor_id, "acme");
        assert_eq!(task.activity_log[0].timestamp, 200);
        // Mirrored into the flat trail with the same id.
        assert_eq!(db.audit.len(), 1);
        assert_eq!(db.audit[0].id, task.activity_log[0].id);
        assert_eq!(db.audit[0].task_id, id);
    }

    #[test]
    fn test_denied_move_writes_nothing() {
        let (mut db, id) = seeded(TaskStatus::Assigned, "acme");
        let err = move_task(&mut db, id, TaskStatus::Accepted, &sub("bravo"), 200).unwrap_err();
        assert_eq!(err, WorkflowError::Denied(DenyReason::NotAssignee));

        let task = db.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert!(task.activity_log.is_empty());
        assert!(db.audit.is_empty());
    }

    #[test]
    fn test_client_verdict_and_rework_loop() {
        let (mut db, id) = seeded(TaskStatus::InspectionRequested, "acme");
        move_task(&mut db, id, TaskStatus::ReworkRequired, &client(), 200).unwrap();
        assert_eq!(db.get(id).unwrap().status, TaskStatus::ReworkRequired);

        // A subcontractor cannot deliver the verdict, even as assignee.
        let (mut db2, id2) = seeded(TaskStatus::InspectionRequested, "acme");
        let err = move_task(&mut db2, id2, TaskStatus::Approved, &sub("acme"), 200).unwrap_err();
        assert_eq!(err, WorkflowError::Denied(DenyReason::InsufficientRole));

        // The rework loop feeds back into the pipeline.
        move_task(&mut db, id, TaskStatus::WorkDone, &sub("acme"), 300).unwrap();
        move_task(&mut db, id, TaskStatus::InspectionRequested, &sub("acme"), 400).unwrap();
        move_task(&mut db, id, TaskStatus::Approved, &client(), 500).unwrap();
        let task = db.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Approved);
        assert_eq!(task.activity_log.len(), 4);
        assert_eq!(db.audit.len(), 4);
    }

    #[test]
    fn test_move_unknown_task() {
        let mut db = Database::default();
        let err = move_task(&mut db, 42, TaskStatus::Accepted, &client(), 0).unwrap_err();
        assert_eq!(err, WorkflowError::TaskNotFound(42));
    }

    #[test]
    fn test_note_delay_sets_fields_without_logging() {
        let (mut db, id) = seeded(TaskStatus::Accepted, "acme");
        note_delay(&mut db, id, "concrete delivery slipped", &sub("acme"), 900).unwrap();

        let task = db.get(id).unwrap();
        assert!(task.is_delayed);
        assert_eq!(task.delay_reason.as_deref(), Some("concrete delivery slipped"));
        assert_eq!(task.delay_noted_by.as_deref(), Some("acme crew"));
        assert_eq!(task.delay_noted_at, Some(900));
        // Status untouched, and no activity entry is appended for delays.
        assert_eq!(task.status, TaskStatus::Accepted);
        assert!(task.activity_log.is_empty());
        assert!(db.audit.is_empty());
    }

    #[test]
    fn test_note_delay_rejects_blank_reason_and_non_assignee() {
        let (mut db, id) = seeded(TaskStatus::Accepted, "acme");
        let err = note_delay(&mut db, id, "   ", &sub("acme"), 900).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(!db.get(id).unwrap().is_delayed);

        let err = note_delay(&mut db, id, "weather", &sub("bravo"), 900).unwrap_err();
        assert_eq!(err, WorkflowError::Denied(DenyReason::NotAssignee));
        assert!(!db.get(id).unwrap().is_delayed);
    }

    #[test]
    fn test_create_task_is_client_only() {
        let mut db = Database::default();
        let err = create_task(
            &mut db,
            NewTask { title: "Tile bathrooms".into(), ..Default::default() },
            &sub("acme"),
            0,
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::Denied(DenyReason::InsufficientRole));
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn test_add_comment_validates_and_appends() {
        let (mut db, id) = seeded(TaskStatus::Accepted, "acme");
        let err = add_comment(&mut db, id, "  ", &sub("acme"), 10).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let c1 = add_comment(&mut db, id, "rebar inspected", &sub("acme"), 10).unwrap();
        let c2 = add_comment(&mut db, id, "photos attached", &client(), 20).unwrap();
        let task = db.get(id).unwrap();
        assert_eq!((c1, c2), (1, 2));
        assert_eq!(task.comments.len(), 2);
        assert_eq!(task.comments[1].author_name, "Site Manager");
    }

    #[test]
    fn test_add_document_records_metadata() {
        let (mut db, id) = seeded(TaskStatus::WorkDone, "acme");
        let doc = add_document(
            &mut db,
            id,
            NewDocument { name: "permit.pdf".into(), size: 48_213, mime_type: "application/pdf".into() },
            &sub("acme"),
            30,
        )
        .unwrap();
        let task = db.get(id).unwrap();
        assert_eq!(doc, 1);
        assert_eq!(task.documents[0].uploaded_by, "acme crew");
        assert_eq!(task.documents[0].mime_type, "application/pdf");
    }

    #[test]
    fn test_update_fields_cannot_touch_status() {
        let (mut db, id) = seeded(TaskStatus::Accepted, "acme");
        update_task_fields(
            &mut db,
            id,
            TaskFieldUpdate {
                title: Some("Install HVAC ducting, floors 1-3".into()),
                priority: Some(Priority::Low),
                clear_assignee: true,
                ..Default::default()
            },
            50,
        )
        .unwrap();
        let task = db.get(id).unwrap();
        assert_eq!(task.title, "Install HVAC ducting, floors 1-3");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.assigned_to, None);
        // TaskFieldUpdate has no status member; the pipeline is untouched.
        assert_eq!(task.status, TaskStatus::Accepted);
    }

    #[test]
    fn test_add_milestone_is_client_only() {
        let mut db = Database::default();
        let due = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let err = add_milestone(
            &mut db,
            NewMilestone { title: "Roof watertight".into(), due, status: crate::fields::MilestoneStatus::Pending },
            &sub("acme"),
            0,
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::Denied(DenyReason::InsufficientRole));

        let id = add_milestone(
            &mut db,
            NewMilestone { title: "Roof watertight".into(), due, status: crate::fields::MilestoneStatus::Pending },
            &client(),
            0,
        )
        .unwrap();
        assert_eq!(id, 1);
        assert_eq!(db.milestones.len(), 1);
    }
}
