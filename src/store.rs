use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::db;
use crate::error::TrackerError;
use crate::model::{Assignment, RosterEntry, Role, Session};

/// Read/write access to the persisted tracker records.
pub trait Store {
    /// Stored assignments; empty when the record is absent or unreadable.
    fn load(&mut self) -> Result<Vec<Assignment>, TrackerError>;

    /// Replaces the whole stored collection.
    fn save(&mut self, list: &[Assignment]) -> Result<(), TrackerError>;

    fn load_roster(&mut self, role: Role) -> Result<Vec<RosterEntry>, TrackerError>;

    fn session(&mut self) -> Result<Option<Session>, TrackerError>;

    fn set_session(&mut self, session: &Session) -> Result<(), TrackerError>;

    fn clear_session(&mut self) -> Result<(), TrackerError>;

    /// Load, transform, save as one unit. Nothing is written when `f` fails.
    fn apply<F>(&mut self, f: F) -> Result<Vec<Assignment>, TrackerError>
    where
        F: FnOnce(&[Assignment]) -> Result<Vec<Assignment>, TrackerError>,
    {
        let current = self.load()?;
        let next = f(&current)?;
        self.save(&next)?;
        Ok(next)
    }
}

pub struct SqliteStore {
    conn: Connection,
    rosters: HashMap<Role, Vec<RosterEntry>>,
}

impl SqliteStore {
    pub fn open(workspace: &Path, seed: bool) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        if seed {
            let written = db::seed_missing(&conn)?;
            if !written.is_empty() {
                tracing::info!(keys = ?written, "seeded missing records");
            }
        }
        Ok(Self {
            conn,
            rosters: HashMap::new(),
        })
    }
}

fn read_assignments(conn: &Connection) -> Result<Vec<Assignment>, TrackerError> {
    let Some(raw) = db::kv_get_raw(conn, db::KEY_ASSIGNMENTS)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<Assignment>>(&raw) {
        Ok(list) => Ok(list),
        Err(e) => {
            warn!(error = %e, "stored assignments are malformed; treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Like `read_assignments`, but refuses a malformed record instead of
/// reading it as empty, so a write never replaces data it could not decode.
fn read_assignments_for_write(conn: &Connection) -> Result<Vec<Assignment>, TrackerError> {
    let Some(raw) = db::kv_get_raw(conn, db::KEY_ASSIGNMENTS)? else {
        return Ok(Vec::new());
    };
    serde_json::from_str::<Vec<Assignment>>(&raw).map_err(|e| {
        warn!(error = %e, "stored assignments are malformed; refusing to overwrite");
        TrackerError::Storage(format!("stored assignments are malformed: {e}"))
    })
}

fn write_assignments(conn: &Connection, list: &[Assignment]) -> Result<(), TrackerError> {
    let value = serde_json::to_value(list).map_err(|e| TrackerError::Storage(e.to_string()))?;
    db::kv_set_json(conn, db::KEY_ASSIGNMENTS, &value)?;
    debug!(count = list.len(), "assignments saved");
    Ok(())
}

impl Store for SqliteStore {
    fn load(&mut self) -> Result<Vec<Assignment>, TrackerError> {
        read_assignments(&self.conn)
    }

    fn save(&mut self, list: &[Assignment]) -> Result<(), TrackerError> {
        write_assignments(&self.conn, list)
    }

    fn load_roster(&mut self, role: Role) -> Result<Vec<RosterEntry>, TrackerError> {
        if let Some(cached) = self.rosters.get(&role) {
            return Ok(cached.clone());
        }
        let list = match db::kv_get_raw(&self.conn, role.roster_key())? {
            Some(raw) => serde_json::from_str::<Vec<RosterEntry>>(&raw).unwrap_or_else(|e| {
                warn!(roster = role.roster_key(), error = %e, "roster is malformed; treating as empty");
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.rosters.insert(role, list.clone());
        Ok(list)
    }

    fn session(&mut self) -> Result<Option<Session>, TrackerError> {
        let Some(raw) = db::kv_get_raw(&self.conn, db::KEY_LOGGED_IN_USER)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str::<Session>(&raw).ok())
    }

    fn set_session(&mut self, session: &Session) -> Result<(), TrackerError> {
        let value =
            serde_json::to_value(session).map_err(|e| TrackerError::Storage(e.to_string()))?;
        db::kv_set_json(&self.conn, db::KEY_LOGGED_IN_USER, &value)?;
        Ok(())
    }

    fn clear_session(&mut self) -> Result<(), TrackerError> {
        db::kv_delete(&self.conn, db::KEY_LOGGED_IN_USER)?;
        Ok(())
    }

    fn apply<F>(&mut self, f: F) -> Result<Vec<Assignment>, TrackerError>
    where
        F: FnOnce(&[Assignment]) -> Result<Vec<Assignment>, TrackerError>,
    {
        // Immediate: take the write lock before reading so concurrent
        // writers against the same file cannot interleave.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = read_assignments_for_write(&tx)?;
        let next = f(&current)?;
        write_assignments(&tx, &next)?;
        tx.commit()?;
        Ok(next)
    }
}

/// Store backed by plain fields, for exercising mutations without SQLite.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub assignments: Vec<Assignment>,
    pub students: Vec<RosterEntry>,
    pub professors: Vec<RosterEntry>,
    pub logged_in: Option<Session>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl Store for MemoryStore {
    fn load(&mut self) -> Result<Vec<Assignment>, TrackerError> {
        Ok(self.assignments.clone())
    }

    fn save(&mut self, list: &[Assignment]) -> Result<(), TrackerError> {
        if self.fail_writes {
            return Err(TrackerError::Storage("quota exceeded".into()));
        }
        self.assignments = list.to_vec();
        Ok(())
    }

    fn load_roster(&mut self, role: Role) -> Result<Vec<RosterEntry>, TrackerError> {
        Ok(match role {
            Role::Student => self.students.clone(),
            Role::Professor => self.professors.clone(),
        })
    }

    fn session(&mut self) -> Result<Option<Session>, TrackerError> {
        Ok(self.logged_in.clone())
    }

    fn set_session(&mut self, session: &Session) -> Result<(), TrackerError> {
        self.logged_in = Some(session.clone());
        Ok(())
    }

    fn clear_session(&mut self) -> Result<(), TrackerError> {
        self.logged_in = None;
        Ok(())
    }
}
