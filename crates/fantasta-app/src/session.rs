// The single draft session: roster, current state and its snapshot stores.

use fantasta_core::{DraftConfig, DraftError, DraftState, MarkOutcome, PickOutcome, Player};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::store::{load_first, SnapshotStore, StoredSnapshot};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no draft in progress; initialize first")]
    NotInitialized,

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no saved snapshot found")]
    NoSnapshot,
}

/// Owns everything one draft needs. Mutations go through here so every
/// successful change is persisted.
pub struct Session {
    roster: Vec<Player>,
    default_config: DraftConfig,
    state: Option<DraftState>,
    stores: Vec<Box<dyn SnapshotStore>>,
}

impl Session {
    pub fn new(
        roster: Vec<Player>,
        default_config: DraftConfig,
        stores: Vec<Box<dyn SnapshotStore>>,
    ) -> Self {
        Self {
            roster,
            default_config,
            state: None,
            stores,
        }
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn default_config(&self) -> &DraftConfig {
        &self.default_config
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Result<&DraftState, SessionError> {
        self.state.as_ref().ok_or(SessionError::NotInitialized)
    }

    fn state_mut(&mut self) -> Result<&mut DraftState, SessionError> {
        self.state.as_mut().ok_or(SessionError::NotInitialized)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a fresh draft from the ingested roster, replacing any current
    /// one. `config` defaults to the configured draft settings.
    pub fn initialize(&mut self, config: Option<DraftConfig>) -> Result<&DraftState, SessionError> {
        let config = config.unwrap_or_else(|| self.default_config.clone());
        let state = DraftState::initialize(self.roster.clone(), config)?;
        self.persist(&state);
        Ok(self.state.insert(state))
    }

    /// Restore the first valid snapshot found in the stores.
    ///
    /// Returns `false` (leaving the session untouched) when there is none or
    /// it cannot be rehydrated.
    pub fn restore(&mut self) -> bool {
        let Some(stored) = load_first(&self.stores) else {
            info!("No saved snapshot, starting fresh");
            return false;
        };
        match DraftState::from_snapshot_value(stored.value) {
            Ok(state) => {
                info!(
                    "Snapshot restored: {} picks, {} unavailable, {} credits left",
                    state.picked.len(),
                    state.unavailable.len(),
                    state.budget_remaining
                );
                self.state = Some(state);
                true
            }
            Err(e) => {
                warn!("Ignoring stored snapshot: {}", e);
                false
            }
        }
    }

    /// Replace the current state with an imported snapshot and persist it.
    /// A malformed snapshot leaves the current state untouched.
    pub fn import_snapshot(
        &mut self,
        value: serde_json::Value,
    ) -> Result<&DraftState, SessionError> {
        let state = DraftState::from_snapshot_value(value)?;
        info!("Imported snapshot with {} picks", state.picked.len());
        self.persist(&state);
        Ok(self.state.insert(state))
    }

    /// The most recent snapshot held by any store.
    pub fn stored_snapshot(&self) -> Result<StoredSnapshot, SessionError> {
        load_first(&self.stores).ok_or(SessionError::NoSnapshot)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn pick(&mut self, name: &str, price: u32) -> Result<PickOutcome, SessionError> {
        let outcome = self.state_mut()?.pick(name, price)?;
        self.persist_current();
        Ok(outcome)
    }

    pub fn mark_unavailable(
        &mut self,
        name: &str,
        price: u32,
        owner: Option<&str>,
    ) -> Result<MarkOutcome, SessionError> {
        let outcome = self.state_mut()?.mark_unavailable(name, price, owner)?;
        self.persist_current();
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist_current(&self) {
        if let Some(state) = &self.state {
            self.persist(state);
        }
    }

    /// Write `state` to every store. Failures are logged and otherwise
    /// ignored: the in-memory state stays authoritative.
    ///
    /// Blocking I/O, called with the session lock held so saves land in
    /// mutation order. Each save is one SQLite row and one small file.
    fn persist(&self, state: &DraftState) {
        let snapshot = match state.to_snapshot_value() {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to serialize draft state: {}", e);
                return;
            }
        };
        for store in &self.stores {
            if let Err(e) = store.save(&snapshot) {
                warn!("Failed to persist to {} store: {:#}", store.name(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use fantasta_core::Role;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// In-memory store that can be told to fail.
    #[derive(Clone, Default)]
    struct MemoryStore {
        slot: Arc<Mutex<Option<serde_json::Value>>>,
        fail: bool,
    }

    impl SnapshotStore for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }
        fn save(&self, snapshot: &serde_json::Value) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("store unavailable");
            }
            *self.slot.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
        fn load(&self) -> anyhow::Result<Option<serde_json::Value>> {
            Ok(self.slot.lock().unwrap().clone())
        }
    }

    fn roster() -> Vec<Player> {
        vec![
            Player::new("Maignan", Role::Goalkeeper, 18.0),
            Player::new("Bastoni", Role::Defender, 16.0),
            Player::new("Barella", Role::Midfielder, 22.0),
            Player::new("Lautaro", Role::Attacker, 45.0),
        ]
    }

    fn session_with(store: MemoryStore) -> Session {
        Session::new(roster(), DraftConfig::default(), vec![Box::new(store)])
    }

    #[test]
    fn operations_require_initialization() {
        let mut session = session_with(MemoryStore::default());
        assert!(matches!(session.state(), Err(SessionError::NotInitialized)));
        assert!(matches!(
            session.pick("Barella", 10),
            Err(SessionError::NotInitialized)
        ));
        assert!(matches!(
            session.mark_unavailable("Barella", 10, None),
            Err(SessionError::NotInitialized)
        ));
    }

    #[test]
    fn initialize_and_pick_persist_snapshots() {
        let store = MemoryStore::default();
        let mut session = session_with(store.clone());

        session.initialize(None).unwrap();
        assert!(store.load().unwrap().is_some());

        session.pick("barella", 25).unwrap();
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved["budget_remaining"], json!(175));
        assert_eq!(saved["picked"][0]["name"], json!("Barella"));
    }

    #[test]
    fn initialize_with_override() {
        let mut session = session_with(MemoryStore::default());
        let config = DraftConfig {
            total_budget: 500,
            ..DraftConfig::default()
        };
        let state = session.initialize(Some(config)).unwrap();
        assert_eq!(state.budget_remaining, 500);
    }

    #[test]
    fn invalid_override_keeps_previous_state() {
        let mut session = session_with(MemoryStore::default());
        session.initialize(None).unwrap();
        session.pick("Lautaro", 40).unwrap();

        let config = DraftConfig {
            top_k: 0,
            ..DraftConfig::default()
        };
        let err = session.initialize(Some(config)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Draft(DraftError::InvalidConfiguration { .. })
        ));
        assert_eq!(session.state().unwrap().picked.len(), 1);
    }

    #[test]
    fn store_failure_does_not_fail_mutation() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let mut session = session_with(store);
        session.initialize(None).unwrap();
        let outcome = session.pick("Lautaro", 30).unwrap();
        assert_eq!(outcome.budget_remaining, 170);
        assert_eq!(session.state().unwrap().picked.len(), 1);
    }

    #[test]
    fn restore_from_store() {
        let store = MemoryStore::default();
        {
            let mut session = session_with(store.clone());
            session.initialize(None).unwrap();
            session.pick("Bastoni", 12).unwrap();
            session.mark_unavailable("Maignan", 8, Some("Marco")).unwrap();
        }

        let mut session = session_with(store);
        assert!(session.restore());
        let state = session.state().unwrap();
        assert_eq!(state.budget_remaining, 188);
        assert_eq!(state.opponents["Marco"].budget_remaining, 192);
    }

    #[test]
    fn restore_ignores_malformed_snapshot() {
        let store = MemoryStore::default();
        store.save(&json!({"budget_remaining": 10})).unwrap();
        let mut session = session_with(store);
        assert!(!session.restore());
        assert!(!session.is_initialized());
    }

    #[test]
    fn restore_with_empty_store() {
        let mut session = session_with(MemoryStore::default());
        assert!(!session.restore());
        assert!(matches!(
            session.stored_snapshot(),
            Err(SessionError::NoSnapshot)
        ));
    }

    #[test]
    fn import_malformed_snapshot_keeps_state() {
        let store = MemoryStore::default();
        let mut session = session_with(store.clone());
        session.initialize(None).unwrap();
        session.pick("Barella", 20).unwrap();
        let before = session.state().unwrap().clone();

        let err = session.import_snapshot(json!({"picked": []})).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Draft(DraftError::MalformedSnapshot(_))
        ));
        assert_eq!(session.state().unwrap(), &before);
        // The store still holds the last good state.
        let saved = store.load().unwrap().unwrap();
        assert_eq!(DraftState::from_snapshot_value(saved).unwrap(), before);
    }

    #[test]
    fn import_replaces_state_and_persists() {
        let store = MemoryStore::default();
        let mut session = session_with(store.clone());
        session.initialize(None).unwrap();

        let mut other = DraftState::initialize(roster(), DraftConfig::default()).unwrap();
        other.pick("Lautaro", 60).unwrap();
        let snapshot = other.to_snapshot_value().unwrap();

        session.import_snapshot(snapshot.clone()).unwrap();
        assert_eq!(session.state().unwrap(), &other);
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn sqlite_store_round_trip() {
        let mut session = Session::new(
            roster(),
            DraftConfig::default(),
            vec![Box::new(Database::open(":memory:").unwrap())],
        );
        session.initialize(None).unwrap();
        session.pick("Maignan", 15).unwrap();
        let stored = session.stored_snapshot().unwrap();
        assert!(stored.saved_at.is_some());
        let restored = DraftState::from_snapshot_value(stored.value).unwrap();
        assert_eq!(&restored, session.state().unwrap());
    }
}
