//! Analytics engine: derived performance and project-health metrics.
//!
//! Everything here is recomputed from the live task collection on each call.
//! Nothing is cached on the entities, so the numbers can never go stale
//! against the latest mutations.

use std::collections::BTreeMap;

use crate::fields::TaskStatus;
use crate::task::Task;

/// Per-assignee counters, derived on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceRecord {
    pub total_tasks: u32,
    pub completed_on_time: u32,
    pub delayed: u32,
    pub inspection_passed: u32,
    pub inspection_failed: u32,
}

impl PerformanceRecord {
    /// Share of this assignee's tasks completed on time, rounded percent.
    pub fn on_time_percentage(&self) -> u32 {
        if self.total_tasks == 0 {
            return 0;
        }
        (f64::from(self.completed_on_time) / f64::from(self.total_tasks) * 100.0).round() as u32
    }

    /// Inspection pass rate, rounded percent. An assignee with no tasks is
    /// treated as a 100% pass rate rather than dividing by zero.
    pub fn pass_rate(&self) -> u32 {
        if self.total_tasks == 0 {
            return 100;
        }
        let judged = (self.inspection_passed + self.inspection_failed).max(1);
        (f64::from(self.inspection_passed) / f64::from(judged) * 100.0).round() as u32
    }
}

/// Aggregate ratios over the whole collection, as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectHealth {
    pub completion_pct: f64,
    pub on_time_pct: f64,
    pub delayed_pct: f64,
    pub inspection_pass_rate: f64,
}

/// Tally per-assignee counters for every task with an assignee.
///
/// `Approved` counts as completed on time and inspection passed;
/// `ReworkRequired` counts as inspection failed; the delay flag is counted
/// independently of status.
pub fn compute_performance(tasks: &[Task]) -> BTreeMap<String, PerformanceRecord> {
    let mut performance: BTreeMap<String, PerformanceRecord> = BTreeMap::new();
    for task in tasks {
        let Some(ref assignee) = task.assigned_to else {
            continue;
        };
        let rec = performance.entry(assignee.clone()).or_default();
        rec.total_tasks += 1;
        if task.status == TaskStatus::Approved {
            rec.completed_on_time += 1;
            rec.inspection_passed += 1;
        }
        if task.is_delayed {
            rec.delayed += 1;
        }
        if task.status == TaskStatus::ReworkRequired {
            rec.inspection_failed += 1;
        }
    }
    performance
}

/// Overall health ratios, or `None` for an empty collection so callers
/// never divide by zero.
pub fn project_health(tasks: &[Task]) -> Option<ProjectHealth> {
    let total = tasks.len();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    let completed = tasks.iter().filter(|t| t.status == TaskStatus::Approved).count() as f64;
    let delayed = tasks.iter().filter(|t| t.is_delayed).count() as f64;
    let failed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::ReworkRequired)
        .count() as f64;

    Some(ProjectHealth {
        completion_pct: completed / total * 100.0,
        on_time_pct: (total - delayed) / total * 100.0,
        delayed_pct: delayed / total * 100.0,
        inspection_pass_rate: (total - failed) / total * 100.0,
    })
}

/// Count delayed tasks per recorded reason, for the performance view.
pub fn delay_reasons(tasks: &[Task]) -> BTreeMap<String, u32> {
    let mut reasons: BTreeMap<String, u32> = BTreeMap::new();
    for task in tasks {
        if task.is_delayed {
            if let Some(ref reason) = task.delay_reason {
                *reasons.entry(reason.clone()).or_default() += 1;
            }
        }
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    fn task(assignee: Option<&str>, status: TaskStatus, delayed: bool) -> Task {
        Task {
            id: 0,
            title: "t".into(),
            description: None,
            status,
            assigned_to: assignee.map(String::from),
            priority: Priority::Medium,
            due: None,
            start: None,
            is_delayed: delayed,
            delay_reason: delayed.then(|| "supplier backlog".to_string()),
            delay_noted_by: None,
            delay_noted_at: None,
            comments: vec![],
            documents: vec![],
            activity_log: vec![],
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn test_performance_counters() {
        let tasks = vec![
            task(Some("acme"), TaskStatus::Approved, false),
            task(Some("acme"), TaskStatus::Approved, false),
            task(Some("acme"), TaskStatus::ReworkRequired, true),
            task(Some("bravo"), TaskStatus::Accepted, false),
            task(None, TaskStatus::Approved, false),
        ];
        let perf = compute_performance(&tasks);
        let acme = perf["acme"];
        assert_eq!(acme.total_tasks, 3);
        assert_eq!(acme.completed_on_time, 2);
        assert_eq!(acme.delayed, 1);
        assert_eq!(acme.inspection_passed, 2);
        assert_eq!(acme.inspection_failed, 1);

        let bravo = perf["bravo"];
        assert_eq!(bravo.total_tasks, 1);
        assert_eq!(bravo.completed_on_time, 0);

        // The unassigned task contributes to nobody.
        assert_eq!(perf.len(), 2);
    }

    #[test]
    fn test_ratio_guards() {
        let zero = PerformanceRecord::default();
        assert_eq!(zero.on_time_percentage(), 0);
        assert_eq!(zero.pass_rate(), 100);

        // In progress only: nothing judged yet, max(1, ..) keeps it at 0.
        let unjudged = PerformanceRecord { total_tasks: 2, ..Default::default() };
        assert_eq!(unjudged.pass_rate(), 0);

        let acme = PerformanceRecord {
            total_tasks: 3,
            completed_on_time: 2,
            delayed: 1,
            inspection_passed: 2,
            inspection_failed: 1,
        };
        assert_eq!(acme.on_time_percentage(), 67);
        assert_eq!(acme.pass_rate(), 67);
    }

    #[test]
    fn test_health_none_when_empty() {
        assert_eq!(project_health(&[]), None);
    }

    #[test]
    fn test_health_ratios() {
        let tasks = vec![
            task(Some("acme"), TaskStatus::Approved, false),
            task(Some("acme"), TaskStatus::Approved, false),
            task(Some("bravo"), TaskStatus::ReworkRequired, true),
            task(Some("bravo"), TaskStatus::Accepted, false),
        ];
        let health = project_health(&tasks).unwrap();
        assert_eq!(health.completion_pct, 50.0);
        assert_eq!(health.on_time_pct, 75.0);
        assert_eq!(health.delayed_pct, 25.0);
        assert_eq!(health.inspection_pass_rate, 75.0);
    }

    #[test]
    fn test_delay_reasons_breakdown() {
        let mut late = task(Some("acme"), TaskStatus::Accepted, true);
        late.delay_reason = Some("weather".into());
        let tasks = vec![
            late,
            task(Some("bravo"), TaskStatus::Accepted, true),
            task(Some("bravo"), TaskStatus::WorkDone, true),
            task(Some("acme"), TaskStatus::Approved, false),
        ];
        let reasons = delay_reasons(&tasks);
        assert_eq!(reasons["weather"], 1);
        assert_eq!(reasons["supplier backlog"], 2);
    }
}
