use serde_json::{json, Map, Value};

use super::require_session;
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::views;

fn handle_leaderboards(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students = session.roster();
    ok(
        &req.id,
        json!({
            "late": views::late_leaderboard(&students),
            "improvement": views::improvement_leaderboard(&students),
        }),
    )
}

fn handle_team_totals(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students = session.roster();
    // JSON object keys are strings, so team numbers are stringified here.
    let mut totals = Map::new();
    for (team, total) in views::team_totals(&students) {
        totals.insert(team.number().to_string(), json!(total));
    }
    ok(&req.id, json!({ "totals": Value::Object(totals) }))
}

fn handle_team_groups(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students = session.roster();
    let mut groups = Map::new();
    for (team, members) in views::team_groups(&students) {
        groups.insert(team.number().to_string(), json!(members));
    }
    ok(&req.id, json!({ "groups": Value::Object(groups) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "views.leaderboards" => Some(handle_leaderboards(state, req)),
        "views.teamTotals" => Some(handle_team_totals(state, req)),
        "views.teamGroups" => Some(handle_team_groups(state, req)),
        _ => None,
    }
}
