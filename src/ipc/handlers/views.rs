use crate::ipc::error::{ok, tracker_err};
use crate::ipc::helpers::{no_workspace, parse_params, resolve_now};
use crate::ipc::types::{AppState, Request};
use crate::query;
use crate::store::Store;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsParams {
    professor_id: String,
    now: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardParams {
    student_id: String,
    course: Option<String>,
    now: Option<String>,
}

fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: StatsParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let now = match resolve_now(req, p.now.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.load() {
        Ok(all) => ok(
            &req.id,
            json!(query::professor_overview(&all, &p.professor_id, now)),
        ),
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_student_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: DashboardParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let now = match resolve_now(req, p.now.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.load() {
        Ok(all) => ok(
            &req.id,
            json!(query::student_dashboard(
                &all,
                &p.student_id,
                p.course.as_deref(),
                now
            )),
        ),
        Err(e) => tracker_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.get" => Some(handle_stats(state, req)),
        "student.dashboard" => Some(handle_student_dashboard(state, req)),
        _ => None,
    }
}
