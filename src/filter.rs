//! Filter engine: narrowing the task collection.
//!
//! `FilterState` is a single value stored on the database and persisted
//! with it; callers replace it wholesale rather than merging field by
//! field. `filter_tasks` is pure and preserves input order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::TaskStatus;
use crate::task::Task;

/// The saved filter state. Each field is independently optional; an absent
/// field does not constrain that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    /// Due-date ceiling, inclusive. While set, tasks without a due date are
    /// excluded since they cannot be compared.
    pub due_by: Option<NaiveDate>,
}

impl FilterState {
    /// True when no dimension is constrained.
    pub fn is_empty(&self) -> bool {
        self.assignee.is_none() && self.status.is_none() && self.due_by.is_none()
    }
}

/// Narrow `tasks` by the present predicates, ANDed. Never reorders.
pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &FilterState) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| {
            if let Some(ref a) = filters.assignee {
                if t.assigned_to.as_deref() != Some(a.as_str()) {
                    return false;
                }
            }
            if let Some(s) = filters.status {
                if t.status != s {
                    return false;
                }
            }
            if let Some(ceiling) = filters.due_by {
                match t.due {
                    Some(d) if d <= ceiling => {}
                    _ => return false,
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    fn task(id: u64, assignee: Option<&str>, status: TaskStatus, due: Option<NaiveDate>) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: None,
            status,
            assigned_to: assignee.map(String::from),
            priority: Priority::Medium,
            due,
            start: None,
            is_delayed: false,
            delay_reason: None,
            delay_noted_by: None,
            delay_noted_at: None,
            comments: vec![],
            documents: vec![],
            activity_log: vec![],
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_filter_returns_everything_in_order() {
        let tasks = vec![
            task(3, Some("acme"), TaskStatus::Assigned, None),
            task(1, Some("bravo"), TaskStatus::Approved, Some(date(2025, 5, 1))),
            task(2, None, TaskStatus::WorkDone, None),
        ];
        let out = filter_tasks(&tasks, &FilterState::default());
        assert_eq!(out.len(), 3);
        assert_eq!(out.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn test_assignee_is_exact_match() {
        let tasks = vec![
            task(1, Some("acme"), TaskStatus::Assigned, None),
            task(2, Some("acme-east"), TaskStatus::Assigned, None),
            task(3, None, TaskStatus::Assigned, None),
        ];
        let f = FilterState { assignee: Some("acme".into()), ..Default::default() };
        let out = filter_tasks(&tasks, &f);
        assert_eq!(out.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_due_ceiling_excludes_undated_tasks() {
        let tasks = vec![
            task(1, None, TaskStatus::Assigned, Some(date(2025, 6, 1))),
            task(2, None, TaskStatus::Assigned, Some(date(2025, 6, 15))),
            task(3, None, TaskStatus::Assigned, None),
        ];
        let f = FilterState { due_by: Some(date(2025, 6, 1)), ..Default::default() };
        let out = filter_tasks(&tasks, &f);
        // Inclusive ceiling keeps the boundary task; the undated one is out.
        assert_eq!(out.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_present_predicates_are_anded() {
        let tasks = vec![
            task(1, Some("acme"), TaskStatus::WorkDone, Some(date(2025, 6, 1))),
            task(2, Some("acme"), TaskStatus::Assigned, Some(date(2025, 6, 1))),
            task(3, Some("bravo"), TaskStatus::WorkDone, Some(date(2025, 6, 1))),
            task(4, Some("acme"), TaskStatus::WorkDone, Some(date(2025, 7, 1))),
        ];
        let f = FilterState {
            assignee: Some("acme".into()),
            status: Some(TaskStatus::WorkDone),
            due_by: Some(date(2025, 6, 30)),
        };
        let out = filter_tasks(&tasks, &f);
        assert_eq!(out.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    }
}
