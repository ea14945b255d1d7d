use serde_json::json;

use super::{opt_seed, param_i64, require_session};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::Team;

fn handle_swap(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let a = match param_i64(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let b = match param_i64(req, "otherStudentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students = session.swap_teams(a, b);
    ok(&req.id, json!({ "students": students }))
}

fn handle_move(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match param_i64(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let team_no = match param_i64(req, "team") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Arbitrary integers were accepted here historically; now the team set
    // is closed and anything else is rejected at the boundary.
    let Some(team) = Team::new(team_no) else {
        return err(
            &req.id,
            "bad_params",
            "team must be between 1 and 4",
            Some(json!({ "team": team_no })),
        );
    };
    let students = session.move_to_team(student_id, team);
    ok(&req.id, json!({ "students": students }))
}

fn handle_reshuffle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students = session.reshuffle(opt_seed(req));
    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teams.swap" => Some(handle_swap(state, req)),
        "teams.move" => Some(handle_move(state, req)),
        "teams.reshuffle" => Some(handle_reshuffle(state, req)),
        _ => None,
    }
}
