use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: Option<Session>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            workspace: None,
            db: None,
            session: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
