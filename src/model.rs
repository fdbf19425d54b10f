use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::TrackerError;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Completed,
}

impl SubmissionStatus {
    pub fn flipped(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub student_id: String,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub submitted_on: Option<String>,
}

impl Submission {
    pub fn pending(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            status: SubmissionStatus::Pending,
            submitted_on: None,
        }
    }
}

/// An assignment as persisted under the `assignments` record.
///
/// `professor_name` is a copy taken when the assignment is written; roster
/// edits do not flow back into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assignment_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub professor_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub professor_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub due_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drive_template_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub students_assigned: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submissions: Vec<Submission>,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

impl Assignment {
    pub fn find_submission(&self, student_id: &str) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.student_id == student_id)
    }

    /// A missing record is an implicit pending submission.
    pub fn submission_for(&self, student_id: &str) -> Submission {
        self.find_submission(student_id)
            .cloned()
            .unwrap_or_else(|| Submission::pending(student_id))
    }

    pub fn is_assigned_to(&self, student_id: &str) -> bool {
        self.students_assigned.iter().any(|s| s == student_id)
    }

    /// Unowned assignments are visible to every professor.
    pub fn is_visible_to_professor(&self, professor_id: &str) -> bool {
        self.professor_id.trim().is_empty() || self.professor_id == professor_id
    }

    pub fn parsed_due_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.due_date.trim(), DUE_DATE_FORMAT).ok()
    }

    /// Validates and normalizes a draft into a fresh assignment whose
    /// submissions are all pending.
    pub fn from_draft(assignment_id: String, draft: AssignmentDraft) -> Result<Self, TrackerError> {
        let title = validate_title(&draft.title)?;
        let due_date = parse_due_date(&draft.due_date)?;
        let students_assigned = draft.students_assigned.normalized();
        let submissions = sync_submissions(&students_assigned, &[]);
        Ok(Self {
            assignment_id,
            title,
            description: draft.description,
            professor_id: draft.professor_id.trim().to_string(),
            professor_name: draft.professor_name.trim().to_string(),
            due_date: due_date.format(DUE_DATE_FORMAT).to_string(),
            drive_template_link: draft.drive_template_link.trim().to_string(),
            course: normalize_course(draft.course),
            students_assigned,
            submissions,
        })
    }

    /// Returns the patched record. Statuses survive for students that stay
    /// assigned; removed students lose their record.
    pub fn patched(&self, patch: AssignmentPatch) -> Result<Self, TrackerError> {
        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(professor_id) = patch.professor_id {
            next.professor_id = professor_id.trim().to_string();
            // An unowned assignment carries no owner name.
            if next.professor_id.is_empty() && patch.professor_name.is_none() {
                next.professor_name.clear();
            }
        }
        if let Some(professor_name) = patch.professor_name {
            next.professor_name = professor_name.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if let Some(link) = patch.drive_template_link {
            next.drive_template_link = link.trim().to_string();
        }
        if let Some(course) = patch.course {
            next.course = normalize_course(Some(course));
        }
        if let Some(students) = patch.students_assigned {
            next.students_assigned = students.normalized();
        }

        next.title = validate_title(&next.title)?;
        next.due_date = parse_due_date(&next.due_date)?
            .format(DUE_DATE_FORMAT)
            .to_string();
        next.submissions = sync_submissions(&next.students_assigned, &self.submissions);
        Ok(next)
    }
}

pub fn new_assignment_id() -> String {
    format!("A{}", Uuid::new_v4().simple())
}

pub fn validate_title(raw: &str) -> Result<String, TrackerError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TrackerError::validation("title", "title must not be empty"));
    }
    Ok(title.to_string())
}

pub fn parse_due_date(raw: &str) -> Result<NaiveDate, TrackerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TrackerError::validation("dueDate", "due date is required"));
    }
    NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT).map_err(|_| {
        TrackerError::validation("dueDate", format!("expected YYYY-MM-DD, got {raw:?}"))
    })
}

fn normalize_course(course: Option<String>) -> Option<String> {
    course
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Splits comma/space/newline separated input into trimmed, upper-cased IDs,
/// keeping the first occurrence of each.
pub fn normalize_student_ids<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for chunk in raw {
        for part in chunk
            .as_ref()
            .split(|c: char| c == ',' || c.is_whitespace())
        {
            let id = part.trim().to_uppercase();
            if id.is_empty() {
                continue;
            }
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }
    out
}

/// One submission per assigned student, in `students_assigned` order.
pub fn sync_submissions(students_assigned: &[String], existing: &[Submission]) -> Vec<Submission> {
    students_assigned
        .iter()
        .map(|sid| {
            existing
                .iter()
                .find(|s| &s.student_id == sid)
                .cloned()
                .unwrap_or_else(|| Submission::pending(sid))
        })
        .collect()
}

/// Student IDs as the UI sends them: either a list or one raw text field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StudentIdsInput {
    List(Vec<String>),
    Raw(String),
}

impl Default for StudentIdsInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl StudentIdsInput {
    pub fn normalized(&self) -> Vec<String> {
        match self {
            Self::List(items) => normalize_student_ids(items),
            Self::Raw(text) => normalize_student_ids([text]),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDraft {
    #[serde(default)]
    pub assignment_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub professor_id: String,
    #[serde(default)]
    pub professor_name: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub drive_template_link: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub students_assigned: StudentIdsInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub professor_id: Option<String>,
    pub professor_name: Option<String>,
    pub due_date: Option<String>,
    pub drive_template_link: Option<String>,
    pub course: Option<String>,
    pub students_assigned: Option<StudentIdsInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Professor,
}

impl Role {
    pub fn roster_key(self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Professor => "professors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Roster entry without the credential, for anything leaving the process.
#[derive(Debug, Clone, Serialize)]
pub struct RosterProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&RosterEntry> for RosterProfile {
    fn from(e: &RosterEntry) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            email: e.email.clone(),
        }
    }
}

/// The `loggedInUser` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, due: &str, students: &[&str]) -> AssignmentDraft {
        AssignmentDraft {
            title: title.to_string(),
            due_date: due.to_string(),
            students_assigned: StudentIdsInput::List(
                students.iter().map(|s| s.to_string()).collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn student_ids_are_split_trimmed_uppercased_and_deduped() {
        let ids = normalize_student_ids(["s1, s2\ns3  S1", " s4 ", ""]);
        assert_eq!(ids, vec!["S1", "S2", "S3", "S4"]);

        let raw = StudentIdsInput::Raw("a1,,a2\n\na1".into());
        assert_eq!(raw.normalized(), vec!["A1", "A2"]);
    }

    #[test]
    fn draft_requires_title_and_calendar_due_date() {
        let e = Assignment::from_draft("A1".into(), draft("  ", "2025-01-01", &[])).unwrap_err();
        assert_eq!(e.code(), "validation_failed");

        let e = Assignment::from_draft("A1".into(), draft("Essay", "2025-02-30", &[])).unwrap_err();
        assert!(matches!(e, TrackerError::Validation { ref field, .. } if field == "dueDate"));

        let e = Assignment::from_draft("A1".into(), draft("Essay", "", &[])).unwrap_err();
        assert_eq!(e.code(), "validation_failed");
    }

    #[test]
    fn draft_builds_pending_submission_per_student() {
        let a = Assignment::from_draft("A1".into(), draft(" Essay ", "2025-03-05", &["s1", " S2 "]))
            .expect("valid draft");
        assert_eq!(a.title, "Essay");
        assert_eq!(a.students_assigned, vec!["S1", "S2"]);
        assert_eq!(a.submissions.len(), 2);
        assert!(a
            .submissions
            .iter()
            .all(|s| s.status == SubmissionStatus::Pending && s.submitted_on.is_none()));
    }

    #[test]
    fn sync_keeps_retained_statuses_and_drops_removed() {
        let existing = vec![
            Submission {
                student_id: "S1".into(),
                status: SubmissionStatus::Completed,
                submitted_on: Some("2025-01-02".into()),
            },
            Submission {
                student_id: "S2".into(),
                status: SubmissionStatus::Completed,
                submitted_on: Some("2025-01-03".into()),
            },
        ];
        let next = sync_submissions(&["S2".to_string(), "S3".to_string()], &existing);
        assert_eq!(next[0], existing[1]);
        assert_eq!(next[1], Submission::pending("S3"));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn missing_submission_reads_as_pending() {
        let a = Assignment {
            assignment_id: "A1".into(),
            students_assigned: vec!["S1".into()],
            ..Default::default()
        };
        assert_eq!(a.submission_for("S1"), Submission::pending("S1"));
    }

    #[test]
    fn unowned_assignment_is_visible_to_every_professor() {
        let mut a = Assignment::default();
        assert!(a.is_visible_to_professor("P1"));
        a.professor_id = "P2".into();
        assert!(!a.is_visible_to_professor("P1"));
        assert!(a.is_visible_to_professor("P2"));
    }

    #[test]
    fn clearing_owner_drops_stale_professor_name() {
        let mut a = Assignment::from_draft("A1".into(), draft("Essay", "2025-03-05", &["S1"]))
            .expect("valid draft");
        a.professor_id = "P1".into();
        a.professor_name = "Dr. One".into();

        let unowned = a
            .patched(AssignmentPatch {
                professor_id: Some("  ".into()),
                ..Default::default()
            })
            .expect("patch");
        assert_eq!(unowned.professor_id, "");
        assert_eq!(unowned.professor_name, "");

        let renamed = a
            .patched(AssignmentPatch {
                professor_id: Some("".into()),
                professor_name: Some("Guest".into()),
                ..Default::default()
            })
            .expect("patch");
        assert_eq!(renamed.professor_name, "Guest");

        let untouched = a
            .patched(AssignmentPatch {
                title: Some("Essay II".into()),
                ..Default::default()
            })
            .expect("patch");
        assert_eq!(untouched.professor_name, "Dr. One");
    }

    #[test]
    fn legacy_nulls_deserialize_as_empty() {
        let a: Assignment = serde_json::from_value(serde_json::json!({
            "assignmentId": "A9",
            "title": "Lab",
            "description": null,
            "studentsAssigned": null,
            "submissions": [{ "studentId": "S1", "status": "completed", "submittedOn": "2024-01-01" }]
        }))
        .expect("parse");
        assert_eq!(a.description, "");
        assert!(a.students_assigned.is_empty());
        assert_eq!(a.submissions[0].status, SubmissionStatus::Completed);
    }
}
