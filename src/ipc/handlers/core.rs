use std::path::PathBuf;
use std::rc::Rc;

use serde_json::json;

use super::require_session;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::remote::FileStore;
use crate::session::Session;

/// Remote path of the one classroom session this daemon serves.
const SESSION_PATH: &str = "session";

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // A broken preference database must not block the session; prefs fall
    // back to defaults on the shell side.
    let prefs_available = match db::open_db(&path) {
        Ok(conn) => {
            state.db = Some(conn);
            true
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "preference store unavailable");
            state.db = None;
            false
        }
    };

    let store = FileStore::open(&path.join("remote-store.json"));
    let seed = req.params.get("bootstrapSeed").and_then(|v| v.as_u64());
    let session = Session::open(Rc::new(store), SESSION_PATH, seed);
    let students = session.roster();

    state.workspace = Some(path.clone());
    state.session = Some(session);

    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "prefsAvailable": prefs_available,
            "students": students,
        }),
    )
}

fn handle_sync_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(&req.id, json!(session.sync_status()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "sync.status" => Some(handle_sync_status(state, req)),
        _ => None,
    }
}
