use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::calc::{self, AssignmentStats, DueStatus, StudentProgress};
use crate::model::{Assignment, Role, Submission, SubmissionStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    DueSoon,
    PastDue,
    Incomplete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    DueAsc,
    DueDesc,
    CompletionDesc,
}

/// Assignments a user of `role` works with: a professor sees their own plus
/// unowned ones, a student sees those they are assigned to.
pub fn list_assignments_for(list: &[Assignment], role: Role, owner_id: &str) -> Vec<Assignment> {
    match role {
        Role::Professor => list
            .iter()
            .filter(|a| a.is_visible_to_professor(owner_id))
            .cloned()
            .collect(),
        Role::Student => {
            let sid = owner_id.trim().to_uppercase();
            list.iter().filter(|a| a.is_assigned_to(&sid)).cloned().collect()
        }
    }
}

fn matches_search(a: &Assignment, term: &str) -> bool {
    a.title.to_lowercase().contains(term)
        || a.description.to_lowercase().contains(term)
        || a.professor_name.to_lowercase().contains(term)
}

fn matches_filter(a: &Assignment, filter: StatusFilter, now: NaiveDateTime) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::DueSoon => calc::due_status(a, now) == DueStatus::DueSoon,
        StatusFilter::PastDue => calc::due_status(a, now) == DueStatus::PastDue,
        StatusFilter::Incomplete => calc::completion_count(a) < a.students_assigned.len(),
    }
}

/// Unparseable dates sort after every real date in both directions.
fn cmp_due(a: &Assignment, b: &Assignment, descending: bool) -> Ordering {
    match (a.parsed_due_date(), b.parsed_due_date()) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Search, then status filter, then a stable sort. `list` is left untouched.
pub fn query_assignments(
    list: &[Assignment],
    search: &str,
    filter: StatusFilter,
    sort: SortKey,
    now: NaiveDateTime,
) -> Vec<Assignment> {
    let term = search.trim().to_lowercase();
    let mut out: Vec<Assignment> = list
        .iter()
        .filter(|a| term.is_empty() || matches_search(a, &term))
        .filter(|a| matches_filter(a, filter, now))
        .cloned()
        .collect();

    match sort {
        SortKey::DueAsc => out.sort_by(|a, b| cmp_due(a, b, false)),
        SortKey::DueDesc => out.sort_by(|a, b| cmp_due(a, b, true)),
        SortKey::CompletionDesc => out.sort_by(|a, b| {
            calc::completion_ratio(b).total_cmp(&calc::completion_ratio(a))
        }),
    }
    out
}

/// An assignment together with the figures the dashboards display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub completion_count: usize,
    pub completion_percent: u32,
    pub due_status: DueStatus,
    pub days_remaining: Option<i64>,
    pub due_date_display: String,
}

impl AssignmentView {
    pub fn build(assignment: Assignment, now: NaiveDateTime) -> Self {
        Self {
            completion_count: calc::completion_count(&assignment),
            completion_percent: calc::completion_percent(&assignment),
            due_status: calc::due_status(&assignment, now),
            days_remaining: calc::days_remaining(&assignment, now),
            due_date_display: calc::format_display_date(&assignment.due_date),
            assignment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorOverview {
    #[serde(flatten)]
    pub stats: AssignmentStats,
    pub completion_rate: u32,
    pub assignments: Vec<AssignmentView>,
}

pub fn professor_overview(
    list: &[Assignment],
    professor_id: &str,
    now: NaiveDateTime,
) -> ProfessorOverview {
    let mine = list_assignments_for(list, Role::Professor, professor_id);
    let stats = calc::aggregate_stats(&mine);
    ProfessorOverview {
        completion_rate: calc::overall_completion_percent(&stats),
        stats,
        assignments: mine
            .into_iter()
            .map(|a| AssignmentView::build(a, now))
            .collect(),
    }
}

/// What a student sees for one assignment. Other students' records stay out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignmentView {
    pub assignment_id: String,
    pub title: String,
    pub description: String,
    pub professor_name: String,
    pub due_date: String,
    pub due_date_display: String,
    pub drive_template_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    pub submission: Submission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_on_display: Option<String>,
    pub due_status: DueStatus,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub student_id: String,
    pub assignments: Vec<StudentAssignmentView>,
    pub courses: Vec<String>,
    pub submitted_assignment_ids: Vec<String>,
    pub progress: StudentProgress,
}

pub fn student_dashboard(
    list: &[Assignment],
    student_id: &str,
    course: Option<&str>,
    now: NaiveDateTime,
) -> StudentDashboard {
    let sid = student_id.trim().to_uppercase();
    let mine = list_assignments_for(list, Role::Student, &sid);

    let mut courses: Vec<String> = Vec::new();
    for c in mine.iter().filter_map(|a| a.course.as_deref()) {
        if !c.is_empty() && !courses.iter().any(|x| x == c) {
            courses.push(c.to_string());
        }
    }

    let submitted_assignment_ids = mine
        .iter()
        .filter(|a| a.submission_for(&sid).status == SubmissionStatus::Completed)
        .map(|a| a.assignment_id.clone())
        .collect();
    let progress = calc::student_progress(&mine, &sid);

    let course = course.map(str::trim).filter(|c| !c.is_empty());
    let assignments = mine
        .iter()
        .filter(|a| course.is_none() || a.course.as_deref() == course)
        .map(|a| {
            let submission = a.submission_for(&sid);
            StudentAssignmentView {
                assignment_id: a.assignment_id.clone(),
                title: a.title.clone(),
                description: a.description.clone(),
                professor_name: a.professor_name.clone(),
                due_date: a.due_date.clone(),
                due_date_display: calc::format_display_date(&a.due_date),
                drive_template_link: a.drive_template_link.clone(),
                course: a.course.clone(),
                submitted_on_display: submission
                    .submitted_on
                    .as_deref()
                    .map(calc::format_display_date),
                submission,
                due_status: calc::due_status(a, now),
                days_remaining: calc::days_remaining(a, now),
            }
        })
        .collect();

    StudentDashboard {
        student_id: sid,
        assignments,
        courses,
        submitted_assignment_ids,
        progress,
    }
}
