//! Repository and persistence for the work tracker.
//!
//! This module provides the `Database` struct owning the task and milestone
//! collections, the flat audit trail, and the saved filter state, along with
//! the formatting utilities the CLI renders with. The database is a single
//! JSON document on disk, written atomically.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::filter::FilterState;
use crate::task::{ActivityEntry, Milestone, Task};

/// In-memory repository, mirrored to a JSON document on disk.
///
/// Owns every `Task` and `Milestone` instance; the workflow, filter and
/// analytics engines hold no state of their own.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Flat audit trail mirroring each task's embedded activity log.
    #[serde(default)]
    pub audit: Vec<ActivityEntry>,
    #[serde(default)]
    pub filters: FilterState,
}

impl Database {
    /// Load database from JSON file, creating a new empty database if the
    /// file doesn't exist.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Database::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("Error parsing DB, starting fresh: {e}");
                    Database::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading DB, starting fresh: {e}");
                Database::default()
            }
        }
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Generate the next available milestone ID.
    pub fn next_milestone_id(&self) -> u64 {
        self.milestones.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }

    /// Generate the next available audit entry ID. Entry IDs are allocated
    /// from the flat trail so the mirrored copies share one sequence.
    pub fn next_audit_id(&self) -> u64 {
        self.audit.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// Parse a due date input: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {delta}d")
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Format a task status for display.
pub fn format_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Assigned => "Assigned",
        TaskStatus::Accepted => "Accepted",
        TaskStatus::WorkDone => "WorkDone",
        TaskStatus::InspectionRequested => "Inspection",
        TaskStatus::ReworkRequired => "Rework",
        TaskStatus::Approved => "Approved",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

/// Format a milestone status for display.
pub fn format_milestone_status(s: MilestoneStatus) -> &'static str {
    match s {
        MilestoneStatus::Pending => "Pending",
        MilestoneStatus::Reached => "Reached",
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], today: NaiveDate) {
    println!(
        "{:<5} {:<11} {:<7} {:<10} {:<16} {:<8} {}",
        "ID", "Status", "Pri", "Due", "Assignee", "Delayed", "Title"
    );
    for t in tasks {
        let assignee = t.assigned_to.clone().unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<11} {:<7} {:<10} {:<16} {:<8} {}",
            t.id,
            format_status(t.status),
            format_priority(t.priority),
            format_due_relative(t.due, today),
            truncate(&assignee, 16),
            if t.is_delayed { "yes" } else { "-" },
            t.title,
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
