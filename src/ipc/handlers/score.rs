use serde_json::json;

use super::{param_i64, require_session};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

fn handle_change(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match param_i64(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let delta = match param_i64(req, "delta") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Unknown ids fall through as a no-op; the shell may race a reshuffle.
    let students = session.change_score(student_id, delta);
    ok(&req.id, json!({ "students": students }))
}

fn handle_reset_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    // The confirm step lives in the shell; by the time this arrives it is
    // unconditional.
    let students = session.reset_scores();
    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "score.change" => Some(handle_change(state, req)),
        "score.resetAll" => Some(handle_reset_all(state, req)),
        _ => None,
    }
}
