/// Launch health scoring
///
/// Pure metrics computed from a launch and its in-memory task list:
///
/// - `plan_completeness`: `round(completed / total * 100)`, 0 with no tasks
/// - `platform_coverage_count`: distinct non-empty platforms across tasks
/// - `average_tasks_per_day`: tasks over the launch window in days (minimum 1),
///   or over 14 days when the window is not set
/// - `team_workload_label`: Light (≤ 2/day), Balanced (≤ 5/day), Heavy
/// - `todays_key_moments`: tasks whose due date falls on today's date in a given time zone
/// - `beat_coverage`: template beats with at least one task, when a template applies

use super::templates::LaunchTemplate;
use crate::lifecycle::LaunchProgress;
use crate::models::launch::Launch;
use crate::models::task::Task;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Days assumed when a launch has no window
pub const DEFAULT_WINDOW_DAYS: f64 = 14.0;

/// Qualitative daily workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkloadLabel {
    Light,
    Balanced,
    Heavy,
}

impl WorkloadLabel {
    /// Buckets an average tasks-per-day figure
    pub fn classify(tasks_per_day: f64) -> Self {
        if tasks_per_day <= 2.0 {
            WorkloadLabel::Light
        } else if tasks_per_day <= 5.0 {
            WorkloadLabel::Balanced
        } else {
            WorkloadLabel::Heavy
        }
    }
}

/// Which template beats the plan covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatCoverage {
    pub covered: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

impl BeatCoverage {
    /// Covered beats as a percentage of all beats
    pub fn percent(&self) -> u32 {
        let total = self.covered.len() + self.missing.len();
        if total == 0 {
            return 0;
        }
        ((self.covered.len() as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Computed health of a launch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchHealth {
    pub plan_completeness: u32,
    pub platform_coverage_count: usize,
    pub average_tasks_per_day: f64,
    pub team_workload_label: WorkloadLabel,
    pub todays_key_moments: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat_coverage: Option<BeatCoverage>,
}

/// Completion percentage of a task list
pub fn plan_completeness(tasks: &[Task]) -> u32 {
    LaunchProgress::from_tasks(tasks).progress.round() as u32
}

/// Number of distinct platforms used by a task list
pub fn platform_coverage_count(tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter_map(|t| t.platform.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Average tasks per day over the launch window
pub fn average_tasks_per_day(launch: &Launch, task_count: usize) -> f64 {
    let days = match (launch.launch_start, launch.launch_end) {
        (Some(start), Some(end)) => (end - start).num_days().max(1) as f64,
        _ => DEFAULT_WINDOW_DAYS,
    };

    task_count as f64 / days
}

/// Tasks due on the same calendar date as `now`, in `now`'s time zone
pub fn todays_key_moments<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Vec<Task> {
    let today = now.date_naive();
    let tz = now.timezone();

    tasks
        .iter()
        .filter(|t| {
            t.due_date
                .map(|due| due.with_timezone(&tz).date_naive() == today)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Template beats covered by at least one task's beat code
pub fn beat_coverage(tasks: &[Task], template: &LaunchTemplate) -> BeatCoverage {
    let used: HashSet<&str> = tasks.iter().filter_map(|t| t.beat_code.as_deref()).collect();

    let (covered, missing): (Vec<_>, Vec<_>) = template
        .beats
        .iter()
        .map(|b| b.code)
        .partition(|code| used.contains(code));

    BeatCoverage { covered, missing }
}

/// Computes launch health as of `now`
pub fn calculate_launch_health_at<Tz: TimeZone>(
    launch: &Launch,
    tasks: &[Task],
    template: Option<&LaunchTemplate>,
    now: &DateTime<Tz>,
) -> LaunchHealth {
    let average = average_tasks_per_day(launch, tasks.len());

    LaunchHealth {
        plan_completeness: plan_completeness(tasks),
        platform_coverage_count: platform_coverage_count(tasks),
        average_tasks_per_day: average,
        team_workload_label: WorkloadLabel::classify(average),
        todays_key_moments: todays_key_moments(tasks, now),
        beat_coverage: template.map(|t| beat_coverage(tasks, t)),
    }
}

/// Computes launch health for the current UTC day
///
/// Due dates are stored and exported in UTC, so "today" is the UTC day.
pub fn calculate_launch_health(
    launch: &Launch,
    tasks: &[Task],
    template: Option<&LaunchTemplate>,
) -> LaunchHealth {
    calculate_launch_health_at(launch, tasks, template, &Utc::now())
}
