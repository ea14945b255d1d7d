use serde_json::json;

use super::{param_i64, param_str, require_session};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "students": session.roster() }))
}

fn handle_name_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match param_i64(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match param_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students = session.update_name(student_id, name);
    ok(&req.id, json!({ "students": students }))
}

fn handle_restore_original(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students = session.restore_original_names();
    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.list" => Some(handle_list(state, req)),
        "names.update" => Some(handle_name_update(state, req)),
        "names.restoreOriginal" => Some(handle_restore_original(state, req)),
        _ => None,
    }
}
