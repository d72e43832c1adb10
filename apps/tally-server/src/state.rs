//! Shared application state.

use std::sync::Arc;

use tally_db::{Database, OwnerPasswordGate, PasswordGate, SoftDeleteArchive};

/// Injected into every handler; cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub archive: SoftDeleteArchive,
}

impl AppState {
    /// State whose destructive operations check the password of `owner_username`.
    pub fn new(db: Database, owner_username: &str) -> Self {
        let gate = OwnerPasswordGate::new(db.users(), owner_username);
        Self::with_gate(db, Arc::new(gate))
    }

    pub fn with_gate(db: Database, gate: Arc<dyn PasswordGate>) -> Self {
        let archive = db.archive(gate);
        AppState { db, archive }
    }
}
