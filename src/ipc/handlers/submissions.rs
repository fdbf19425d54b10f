use crate::ipc::error::{ok, tracker_err};
use crate::ipc::helpers::{no_workspace, parse_params, resolve_now};
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, SubmissionStatus};
use crate::mutate;
use crate::store::Store;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetParams {
    assignment_id: String,
    student_id: String,
    status: SubmissionStatus,
    now: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleParams {
    assignment_id: String,
    student_id: String,
    now: Option<String>,
}

fn submission_result(list: &[Assignment], assignment_id: &str, student_id: &str) -> serde_json::Value {
    let sid = student_id.trim().to_uppercase();
    let assignment = list.iter().find(|a| a.assignment_id == assignment_id);
    json!({
        "assignment": assignment,
        "submission": assignment.map(|a| a.submission_for(&sid)),
    })
}

fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: SetParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let today = match resolve_now(req, p.now.as_deref()) {
        Ok(now) => now.date(),
        Err(resp) => return resp,
    };
    let res = store.apply(|current| {
        mutate::set_submission_status(current, &p.assignment_id, &p.student_id, p.status, today)
    });
    match res {
        Ok(list) => {
            info!(
                assignment = %p.assignment_id,
                student = %p.student_id,
                status = ?p.status,
                "submission status set"
            );
            ok(&req.id, submission_result(&list, &p.assignment_id, &p.student_id))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: ToggleParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let today = match resolve_now(req, p.now.as_deref()) {
        Ok(now) => now.date(),
        Err(resp) => return resp,
    };
    let res = store.apply(|current| {
        mutate::toggle_submission_status(current, &p.assignment_id, &p.student_id, today)
    });
    match res {
        Ok(list) => {
            info!(assignment = %p.assignment_id, student = %p.student_id, "submission toggled");
            ok(&req.id, submission_result(&list, &p.assignment_id, &p.student_id))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "submissions.set" => Some(handle_set(state, req)),
        "submissions.toggle" => Some(handle_toggle(state, req)),
        _ => None,
    }
}
