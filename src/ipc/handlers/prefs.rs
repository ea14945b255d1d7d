use serde_json::json;

use super::param_str;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match param_str(req, "key") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Missing or broken preference store reads as "nothing saved yet".
    let value = match state.db.as_ref() {
        Some(conn) => match db::prefs_get(conn, key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %format!("{e:#}"), "prefs read failed");
                None
            }
        },
        None => None,
    };
    ok(&req.id, json!({ "key": key, "value": value }))
}

fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match param_str(req, "key") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let value = match param_str(req, "value") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "prefs_unavailable", "preference store not open", None);
    };
    match db::prefs_set(conn, key, value) {
        Ok(()) => ok(&req.id, json!({ "key": key })),
        Err(e) => err(&req.id, "prefs_write_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "prefs.get" => Some(handle_get(state, req)),
        "prefs.set" => Some(handle_set(state, req)),
        _ => None,
    }
}
