//! Pure old-collection -> new-collection transforms. Persisting the result is
//! the caller's job (see `Store::apply`).

use chrono::NaiveDate;

use crate::error::TrackerError;
use crate::model::{
    normalize_student_ids, parse_due_date, sync_submissions, validate_title, Assignment,
    AssignmentPatch, Submission, SubmissionStatus, DUE_DATE_FORMAT,
};

fn position(current: &[Assignment], assignment_id: &str) -> Result<usize, TrackerError> {
    current
        .iter()
        .position(|a| a.assignment_id == assignment_id)
        .ok_or_else(|| TrackerError::not_found("assignment", assignment_id))
}

pub fn create_assignment(
    current: &[Assignment],
    mut new: Assignment,
) -> Result<Vec<Assignment>, TrackerError> {
    if new.assignment_id.trim().is_empty() {
        return Err(TrackerError::validation("assignmentId", "assignment id is required"));
    }
    if current.iter().any(|a| a.assignment_id == new.assignment_id) {
        return Err(TrackerError::validation(
            "assignmentId",
            format!("assignment {} already exists", new.assignment_id),
        ));
    }
    new.title = validate_title(&new.title)?;
    new.due_date = parse_due_date(&new.due_date)?
        .format(DUE_DATE_FORMAT)
        .to_string();
    new.students_assigned = normalize_student_ids(&new.students_assigned);
    new.submissions = sync_submissions(&new.students_assigned, &[]);

    let mut next = current.to_vec();
    next.push(new);
    Ok(next)
}

pub fn update_assignment(
    current: &[Assignment],
    assignment_id: &str,
    patch: AssignmentPatch,
) -> Result<Vec<Assignment>, TrackerError> {
    let idx = position(current, assignment_id)?;
    let patched = current[idx].patched(patch)?;
    let mut next = current.to_vec();
    next[idx] = patched;
    Ok(next)
}

/// Unknown ids leave the collection as it was.
pub fn delete_assignment(current: &[Assignment], assignment_id: &str) -> Vec<Assignment> {
    current
        .iter()
        .filter(|a| a.assignment_id != assignment_id)
        .cloned()
        .collect()
}

/// `submittedOn` only moves on a real status change: it is stamped with
/// `today` on pending -> completed and cleared on completed -> pending.
/// Re-setting the current status changes nothing.
pub fn set_submission_status(
    current: &[Assignment],
    assignment_id: &str,
    student_id: &str,
    status: SubmissionStatus,
    today: NaiveDate,
) -> Result<Vec<Assignment>, TrackerError> {
    let idx = position(current, assignment_id)?;
    let sid = student_id.trim().to_uppercase();
    if !current[idx].is_assigned_to(&sid) {
        return Err(TrackerError::not_found("student", sid));
    }

    let submitted_on = match status {
        SubmissionStatus::Completed => Some(today.format(DUE_DATE_FORMAT).to_string()),
        SubmissionStatus::Pending => None,
    };

    let mut next = current.to_vec();
    let target = &mut next[idx];
    match target.submissions.iter_mut().find(|s| s.student_id == sid) {
        Some(existing) if existing.status == status => {}
        Some(existing) => {
            existing.status = status;
            existing.submitted_on = submitted_on;
        }
        None => target.submissions.push(Submission {
            student_id: sid,
            status,
            submitted_on,
        }),
    }
    Ok(next)
}

/// Flips one student's status; a missing record counts as pending.
pub fn toggle_submission_status(
    current: &[Assignment],
    assignment_id: &str,
    student_id: &str,
    today: NaiveDate,
) -> Result<Vec<Assignment>, TrackerError> {
    let idx = position(current, assignment_id)?;
    let sid = student_id.trim().to_uppercase();
    let status = current[idx].submission_for(&sid).status.flipped();
    set_submission_status(current, assignment_id, &sid, status, today)
}
