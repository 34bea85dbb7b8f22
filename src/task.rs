//! Work item data structures and command payloads.
//!
//! This module defines the `Task` struct that represents a single unit of
//! subcontracted work, its embedded append-only sequences (comments,
//! documents, activity log), schedule milestones, and the payload structs
//! the engine commands accept.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of subcontracted work moving through the approval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Stable user id of the responsible subcontractor. Company names are
    /// display attributes only and are never consulted for authorization.
    pub assigned_to: Option<String>,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub is_delayed: bool,
    pub delay_reason: Option<String>,
    pub delay_noted_by: Option<String>,
    pub delay_noted_at: Option<i64>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub documents: Vec<DocumentMeta>,
    #[serde(default)]
    pub activity_log: Vec<ActivityEntry>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

/// A comment on a task. Append-only; never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub timestamp: i64,
}

/// Uploaded document metadata. The file content itself is not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_by: String,
    pub uploaded_at: i64,
}

/// One audit record per successful status transition. Immutable once
/// appended; lives both on the originating task and in the flat trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub task_id: u64,
    pub action: String,
    pub actor_id: String,
    pub actor_name: String,
    pub timestamp: i64,
}

/// A schedule milestone, independent of any task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    pub due: NaiveDate,
    pub status: MilestoneStatus,
    pub created_at_utc: i64,
}

/// Payload for task creation. Status is not part of it: new tasks always
/// start in `Assigned`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
}

/// Partial update for the non-status fields of a task. There is no status
/// member, so a field update cannot bypass the workflow engine.
#[derive(Debug, Clone, Default)]
pub struct TaskFieldUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub clear_due: bool,
    pub clear_start: bool,
    pub clear_assignee: bool,
}

/// Payload for recording an uploaded document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// Payload for milestone creation.
#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub title: String,
    pub due: NaiveDate,
    pub status: MilestoneStatus,
}
