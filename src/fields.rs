//! Enumerations and field types for the work tracker.
//!
//! This module defines the closed sets used to categorise work items and
//! actors: lifecycle status, priority, actor roles, and milestone states.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle states a work item moves through.
///
/// The set is closed. Transitions between states are mediated exclusively by
/// the workflow engine; nothing else writes `Task::status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[serde(alias = "Assigned")]
    Assigned,
    #[serde(alias = "Accepted")]
    Accepted,
    #[serde(alias = "WorkDone")]
    WorkDone,
    #[serde(alias = "InspectionRequested")]
    InspectionRequested,
    #[serde(alias = "ReworkRequired")]
    ReworkRequired,
    #[serde(alias = "Approved")]
    Approved,
}

/// Priority classification for work items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// The two actor roles the authorizer distinguishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Client,
    Subcontractor,
}

/// Schedule milestone states. Milestones have their own lifecycle and are
/// never derived from task state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneStatus {
    Pending,
    Reached,
}

/// Stable lowercase slug for a status. Used in activity-log action strings
/// and identical to the on-disk serde name.
pub fn status_slug(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Assigned => "assigned",
        TaskStatus::Accepted => "accepted",
        TaskStatus::WorkDone => "work-done",
        TaskStatus::InspectionRequested => "inspection-requested",
        TaskStatus::ReworkRequired => "rework-required",
        TaskStatus::Approved => "approved",
    }
}
