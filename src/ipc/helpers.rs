use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;

use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::model::DUE_DATE_FORMAT;

/// Decodes `req.params` into `T`, or the `bad_params` response to send back.
pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, serde_json::Value> {
    let params = if req.params.is_null() {
        serde_json::json!({})
    } else {
        req.params.clone()
    };
    serde_json::from_value(params).map_err(|e| err(&req.id, "bad_params", e.to_string(), None))
}

/// Caller-pinned local time (`YYYY-MM-DDTHH:MM:SS` or a bare date), or the
/// current local time when absent.
pub fn resolve_now(req: &Request, raw: Option<&str>) -> Result<NaiveDateTime, serde_json::Value> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Local::now().naive_local());
    };
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| err(&req.id, "bad_params", format!("invalid now: {raw:?}"), None))
}

pub fn no_workspace(req: &Request) -> serde_json::Value {
    err(&req.id, "no_workspace", "select a workspace first", None)
}
