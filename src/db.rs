use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Opens (creating if needed) the per-device preference database inside the
/// workspace. Preferences are device-local UI state only (class note, rules
/// text, chart-open flag); roster data never lands here.
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("conduct.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS prefs(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn prefs_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM prefs WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(value)
}

pub fn prefs_set(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO prefs(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_workspace() -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "conductd-db-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn prefs_roundtrip_and_overwrite() {
        let ws = temp_workspace();
        let conn = open_db(&ws).expect("open db");

        assert_eq!(prefs_get(&conn, "class.note").expect("get"), None);
        prefs_set(&conn, "class.note", "week 3 focus").expect("set");
        assert_eq!(
            prefs_get(&conn, "class.note").expect("get"),
            Some("week 3 focus".to_string())
        );
        prefs_set(&conn, "class.note", "week 4 focus").expect("set");
        assert_eq!(
            prefs_get(&conn, "class.note").expect("get"),
            Some("week 4 focus".to_string())
        );

        let _ = std::fs::remove_dir_all(ws);
    }
}
