//! Role-based authorization for status transitions.
//!
//! `authorize` is a pure decision function over a closed transition table:
//! given an actor, a task and a requested target status, it either allows
//! the move or names the reason it is denied. It never panics and performs
//! no I/O; the workflow engine consults it before every status write.

use thiserror::Error;

use crate::fields::{Role, TaskStatus};
use crate::task::Task;

/// The authenticated identity attempting an operation. Always passed
/// explicitly; the engine reads no ambient user state.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Why a transition was denied. Reported to the caller as a user-facing
/// rejection, never raised as a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("task is assigned to a different subcontractor")]
    NotAssignee,
    #[error("transition is not allowed from the task's current status")]
    IllegalTransition,
    #[error("your role does not permit this transition")]
    InsufficientRole,
}

/// Edges a subcontractor may perform, provided they are the task's assignee.
const SUBCONTRACTOR_EDGES: &[(TaskStatus, TaskStatus)] = &[
    (TaskStatus::Assigned, TaskStatus::Accepted),
    (TaskStatus::Accepted, TaskStatus::WorkDone),
    (TaskStatus::WorkDone, TaskStatus::InspectionRequested),
    (TaskStatus::ReworkRequired, TaskStatus::WorkDone),
];

/// Edges a client may perform: the inspection verdict.
const CLIENT_EDGES: &[(TaskStatus, TaskStatus)] = &[
    (TaskStatus::InspectionRequested, TaskStatus::Approved),
    (TaskStatus::InspectionRequested, TaskStatus::ReworkRequired),
];

/// Decide whether `actor` may move `task` to `target`.
///
/// Subcontractors are checked against the assignee first: a mismatched or
/// unassigned task denies `NotAssignee` before the edge table is consulted.
/// A pair that belongs to the other role's table denies `InsufficientRole`;
/// anything else, including `from == to`, denies `IllegalTransition`.
pub fn authorize(actor: &Actor, task: &Task, target: TaskStatus) -> Result<(), DenyReason> {
    let pair = (task.status, target);
    match actor.role {
        Role::Client => {
            if CLIENT_EDGES.contains(&pair) {
                Ok(())
            } else if SUBCONTRACTOR_EDGES.contains(&pair) {
                Err(DenyReason::InsufficientRole)
            } else {
                Err(DenyReason::IllegalTransition)
            }
        }
        Role::Subcontractor => {
            if task.assigned_to.as_deref() != Some(actor.id.as_str()) {
                return Err(DenyReason::NotAssignee);
            }
            if SUBCONTRACTOR_EDGES.contains(&pair) {
                Ok(())
            } else if CLIENT_EDGES.contains(&pair) {
                Err(DenyReason::InsufficientRole)
            } else {
                Err(DenyReason::IllegalTransition)
            }
        }
    }
}
