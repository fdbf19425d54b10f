use tracing::{info, warn};

use crate::error::TrackerError;
use crate::model::{RosterEntry, Role, Session};
use crate::store::Store;

/// Local credential check against a roster. Emails compare case-insensitively.
pub fn authenticate(
    roster: &[RosterEntry],
    email: &str,
    password: &str,
    role: Role,
) -> Result<Session, TrackerError> {
    let email = email.trim();
    roster
        .iter()
        .find(|u| u.email.trim().eq_ignore_ascii_case(email) && u.password == password)
        .map(|u| Session {
            id: u.id.clone(),
            email: u.email.clone(),
            role,
        })
        .ok_or(TrackerError::Auth)
}

pub fn login<S: Store>(
    store: &mut S,
    email: &str,
    password: &str,
    role: Role,
) -> Result<Session, TrackerError> {
    let roster = store.load_roster(role)?;
    let session = match authenticate(&roster, email, password, role) {
        Ok(s) => s,
        Err(e) => {
            warn!(?role, "login rejected");
            return Err(e);
        }
    };
    store.set_session(&session)?;
    info!(user = %session.id, ?role, "logged in");
    Ok(session)
}

pub fn logout<S: Store>(store: &mut S) -> Result<(), TrackerError> {
    store.clear_session()?;
    info!("logged out");
    Ok(())
}
