use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{Assignment, SubmissionStatus, DUE_DATE_FORMAT};

/// Window (in days, inclusive) in which an assignment counts as due soon.
pub const DUE_SOON_DAYS: i64 = 7;
const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DueStatus {
    PastDue,
    DueSoon,
    Active,
}

/// JS-style `Math.round` for non-negative values.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Rounded percentage; 0 when there is nothing to complete.
pub fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let p = round_half_up(done as f64 * 100.0 / total as f64);
    p.clamp(0.0, 100.0) as u32
}

pub fn completion_count(a: &Assignment) -> usize {
    a.submissions
        .iter()
        .filter(|s| s.status == SubmissionStatus::Completed)
        .count()
}

/// Completed share used for ordering; unassigned counts as a denominator of 1.
pub fn completion_ratio(a: &Assignment) -> f64 {
    completion_count(a) as f64 / a.students_assigned.len().max(1) as f64
}

pub fn completion_percent(a: &Assignment) -> u32 {
    percent(completion_count(a), a.students_assigned.len())
}

/// End of the due day (23:59:59, local). None for an unparseable date.
pub fn due_boundary(a: &Assignment) -> Option<NaiveDateTime> {
    a.parsed_due_date()?.and_hms_opt(23, 59, 59)
}

fn remaining_ms(a: &Assignment, now: NaiveDateTime) -> Option<i64> {
    due_boundary(a).map(|b| (b - now).num_milliseconds())
}

pub fn due_status(a: &Assignment, now: NaiveDateTime) -> DueStatus {
    match remaining_ms(a, now) {
        // Reaching the boundary itself already counts as late.
        Some(ms) if ms <= 0 => DueStatus::PastDue,
        Some(ms) if ms <= DUE_SOON_DAYS * DAY_MS => DueStatus::DueSoon,
        _ => DueStatus::Active,
    }
}

/// Whole days left, rounded up; negative once past due.
pub fn days_remaining(a: &Assignment, now: NaiveDateTime) -> Option<i64> {
    remaining_ms(a, now).map(|ms| {
        let q = ms.div_euclid(DAY_MS);
        if ms.rem_euclid(DAY_MS) == 0 {
            q
        } else {
            q + 1
        }
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub assignments_count: usize,
    pub total_students: usize,
    pub total_completed: usize,
}

pub fn aggregate_stats(list: &[Assignment]) -> AssignmentStats {
    list.iter().fold(AssignmentStats::default(), |acc, a| AssignmentStats {
        assignments_count: acc.assignments_count + 1,
        total_students: acc.total_students + a.students_assigned.len(),
        total_completed: acc.total_completed + completion_count(a),
    })
}

pub fn overall_completion_percent(stats: &AssignmentStats) -> u32 {
    percent(stats.total_completed, stats.total_students)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub total_assignments: usize,
    pub submitted_count: usize,
    pub completion_percent: u32,
}

/// Progress of one student across the assignments given to them.
pub fn student_progress(list: &[Assignment], student_id: &str) -> StudentProgress {
    let total_assignments = list.len();
    let submitted_count = list
        .iter()
        .filter(|a| a.submission_for(student_id).status == SubmissionStatus::Completed)
        .count();
    StudentProgress {
        total_assignments,
        submitted_count,
        completion_percent: percent(submitted_count, total_assignments),
    }
}

/// `5 Mar 2025` style. Accepts a bare date or an ISO date-time; anything
/// else comes back unchanged.
pub fn format_display_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, DUE_DATE_FORMAT) {
        Ok(d) => d.format("%-d %b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
