use crate::error::TrackerError;
use crate::ipc::error::{ok, tracker_err};
use crate::ipc::helpers::{no_workspace, parse_params, resolve_now};
use crate::ipc::types::{AppState, Request};
use crate::model::{new_assignment_id, Assignment, AssignmentDraft, AssignmentPatch, Role};
use crate::mutate;
use crate::query::{self, AssignmentView, SortKey, StatusFilter};
use crate::store::{SqliteStore, Store};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeParams {
    role: Role,
    owner_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams {
    role: Option<Role>,
    #[serde(default)]
    owner_id: String,
    #[serde(default)]
    search: String,
    #[serde(default)]
    filter: StatusFilter,
    #[serde(default)]
    sort: SortKey,
    now: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdParams {
    assignment_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    assignment_id: String,
    #[serde(default)]
    patch: AssignmentPatch,
}

/// Denormalized display name for a professor: name, else email.
fn professor_display_name(
    store: &mut SqliteStore,
    professor_id: &str,
) -> Result<Option<String>, TrackerError> {
    if professor_id.trim().is_empty() {
        return Ok(None);
    }
    let roster = store.load_roster(Role::Professor)?;
    Ok(roster.iter().find(|p| p.id == professor_id).map(|p| {
        if p.name.trim().is_empty() {
            p.email.clone()
        } else {
            p.name.clone()
        }
    }))
}

fn find_updated(list: &[Assignment], assignment_id: &str) -> serde_json::Value {
    json!(list.iter().find(|a| a.assignment_id == assignment_id))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return ok(&req.id, json!({ "assignments": [] }));
    };
    let p: ScopeParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match store.load() {
        Ok(all) => {
            let list = query::list_assignments_for(&all, p.role, &p.owner_id);
            ok(&req.id, json!({ "assignments": list }))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return ok(&req.id, json!({ "assignments": [] }));
    };
    let p: QueryParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let now = match resolve_now(req, p.now.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let all = match store.load() {
        Ok(v) => v,
        Err(e) => return tracker_err(&req.id, &e),
    };
    let scoped = match p.role {
        Some(role) => query::list_assignments_for(&all, role, &p.owner_id),
        None => all,
    };
    let views: Vec<AssignmentView> =
        query::query_assignments(&scoped, &p.search, p.filter, p.sort, now)
            .into_iter()
            .map(|a| AssignmentView::build(a, now))
            .collect();
    ok(&req.id, json!({ "assignments": views }))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: IdParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let all = match store.load() {
        Ok(v) => v,
        Err(e) => return tracker_err(&req.id, &e),
    };
    match all.into_iter().find(|a| a.assignment_id == p.assignment_id) {
        Some(a) => ok(&req.id, json!({ "assignment": a })),
        None => tracker_err(
            &req.id,
            &TrackerError::not_found("assignment", p.assignment_id),
        ),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let mut draft: AssignmentDraft = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let assignment_id = draft
        .assignment_id
        .take()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(new_assignment_id);

    if draft.professor_name.trim().is_empty() {
        match professor_display_name(store, &draft.professor_id) {
            Ok(Some(name)) => draft.professor_name = name,
            Ok(None) => {}
            Err(e) => return tracker_err(&req.id, &e),
        }
    }

    let assignment = match Assignment::from_draft(assignment_id.clone(), draft) {
        Ok(a) => a,
        Err(e) => return tracker_err(&req.id, &e),
    };
    match store.apply(|current| mutate::create_assignment(current, assignment)) {
        Ok(list) => {
            info!(assignment = %assignment_id, "assignment created");
            ok(&req.id, json!({ "assignment": find_updated(&list, &assignment_id) }))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let mut p: UpdateParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let name_missing = p
        .patch
        .professor_name
        .as_deref()
        .map(|n| n.trim().is_empty())
        .unwrap_or(true);
    if name_missing {
        if let Some(pid) = p.patch.professor_id.clone() {
            match professor_display_name(store, &pid) {
                Ok(Some(name)) => p.patch.professor_name = Some(name),
                Ok(None) => {}
                Err(e) => return tracker_err(&req.id, &e),
            }
        }
    }

    let id = p.assignment_id;
    let patch = p.patch;
    match store.apply(|current| mutate::update_assignment(current, &id, patch)) {
        Ok(list) => {
            info!(assignment = %id, "assignment updated");
            ok(&req.id, json!({ "assignment": find_updated(&list, &id) }))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: IdParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let mut deleted = false;
    let res = store.apply(|current| {
        let next = mutate::delete_assignment(current, &p.assignment_id);
        deleted = next.len() != current.len();
        Ok(next)
    });
    match res {
        Ok(_) => {
            if deleted {
                info!(assignment = %p.assignment_id, "assignment deleted");
            }
            ok(&req.id, json!({ "deleted": deleted }))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.list" => Some(handle_list(state, req)),
        "assignments.query" => Some(handle_query(state, req)),
        "assignments.get" => Some(handle_get(state, req)),
        "assignments.create" => Some(handle_create(state, req)),
        "assignments.update" => Some(handle_update(state, req)),
        "assignments.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
