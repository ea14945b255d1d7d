pub mod core;
pub mod prefs;
pub mod roster;
pub mod score;
pub mod teams;
pub mod views;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;

// Small shared param plumbing; handlers answer with an error envelope
// instead of propagating.

pub(crate) fn require_session<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Session, serde_json::Value> {
    state
        .session
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "no workspace selected", None))
}

pub(crate) fn param_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("missing or non-integer params.{}", key),
                None,
            )
        })
}

pub(crate) fn param_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("missing or non-string params.{}", key),
                None,
            )
        })
}

pub(crate) fn opt_seed(req: &Request) -> Option<u64> {
    req.params.get("seed").and_then(|v| v.as_u64())
}
