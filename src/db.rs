use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

pub const DB_FILE: &str = "tracker.sqlite3";

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub const KEY_ASSIGNMENTS: &str = "assignments";
pub const KEY_STUDENTS: &str = "students";
pub const KEY_PROFESSORS: &str = "professors";
pub const KEY_LOGGED_IN_USER: &str = "loggedInUser";

const SEED_ASSIGNMENTS: &str = include_str!("../seed/assignments.json");
const SEED_STUDENTS: &str = include_str!("../seed/students.json");
const SEED_PROFESSORS: &str = include_str!("../seed/professors.json");

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

/// Populates every seeded record that is absent. Existing records win.
/// Returns the keys that were written.
pub fn seed_missing(conn: &Connection) -> anyhow::Result<Vec<&'static str>> {
    let mut written = Vec::new();
    for (key, body) in [
        (KEY_ASSIGNMENTS, SEED_ASSIGNMENTS),
        (KEY_STUDENTS, SEED_STUDENTS),
        (KEY_PROFESSORS, SEED_PROFESSORS),
    ] {
        let inserted = conn.execute(
            "INSERT INTO kv_store(key, value, updated_at)
             VALUES(?, ?, datetime('now'))
             ON CONFLICT(key) DO NOTHING",
            (key, body),
        )?;
        if inserted > 0 {
            written.push(key);
        }
    }
    Ok(written)
}

pub fn kv_get_raw(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(v)
}

pub fn kv_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let body = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO kv_store(key, value, updated_at)
         VALUES(?, ?, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, body),
    )?;
    Ok(())
}

pub fn kv_delete(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
    Ok(())
}
