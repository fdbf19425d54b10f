use crate::auth;
use crate::ipc::error::{ok, tracker_err};
use crate::ipc::helpers::{no_workspace, parse_params};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, RosterProfile};
use crate::store::Store;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct LoginParams {
    email: String,
    password: String,
    role: Role,
}

#[derive(Deserialize)]
struct RosterParams {
    role: Role,
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: LoginParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match auth::login(store, &p.email, &p.password, p.role) {
        Ok(session) => ok(&req.id, json!({ "user": session })),
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    match auth::logout(store) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_session(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return ok(&req.id, json!({ "user": null }));
    };
    match store.session() {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => tracker_err(&req.id, &e),
    }
}

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(req);
    };
    let p: RosterParams = match parse_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match store.load_roster(p.role) {
        Ok(roster) => {
            let people: Vec<RosterProfile> = roster.iter().map(RosterProfile::from).collect();
            ok(&req.id, json!({ "people": people }))
        }
        Err(e) => tracker_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.session" => Some(handle_session(state, req)),
        "roster.list" => Some(handle_roster_list(state, req)),
        _ => None,
    }
}
