//! Local session store: the single writer of [`SessionState`].
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read the state through the signal returned by
//! [`LocalSessionStore::signal`]. Login, logout, the startup probe and
//! cross-tab notifications all funnel through this type so the persisted
//! flags and the in-memory state cannot drift apart within a tab.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never escape. A failed read leaves the current state
//! untouched; a failed write still updates memory, so the current tab keeps
//! working even when persistence does not. Until a later login or logout
//! persists cleanly, storage is known to be stale and re-reads are skipped.
//! Reads may still succeed when only writes fail (quota exceeded).

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::Cell;
use std::rc::Rc;

use leptos::prelude::{ArcRwSignal, GetUntracked, Set};

use super::events::{SessionBus, SessionSignal, SessionUpdate};
use super::probe::{Identity, truthy};
use super::state::SessionState;
use super::storage::{KeyValueStorage, StorageArea, StorageError, TokenPersistence};
use crate::config::ClientConfig;

const LOGGED_FLAG: &str = "1";
const ALL_AREAS: [StorageArea; 2] = [StorageArea::Session, StorageArea::Durable];

pub struct LocalSessionStore {
    storage: Rc<dyn KeyValueStorage>,
    bus: SessionBus,
    logged_key: String,
    name_key: String,
    token_key: String,
    state: ArcRwSignal<SessionState>,
    stale_storage: Cell<bool>,
}

impl LocalSessionStore {
    /// Starts logged out; call [`Self::refresh_from_storage`] to load persisted state.
    pub fn new(config: &ClientConfig, storage: Rc<dyn KeyValueStorage>, bus: SessionBus) -> Self {
        Self {
            storage,
            bus,
            logged_key: config.logged_key(),
            name_key: config.name_key(),
            token_key: config.token_key(),
            state: ArcRwSignal::new(SessionState::default()),
            stale_storage: Cell::new(false),
        }
    }

    /// Reactive handle for components.
    pub fn signal(&self) -> ArcRwSignal<SessionState> {
        self.state.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.get_untracked()
    }

    /// `true` for the login flag, name and token keys.
    pub fn owns_key(&self, key: &str) -> bool {
        key == self.logged_key || key == self.name_key || key == self.token_key
    }

    /// Recompute state from storage. Idempotent; never fails.
    ///
    /// No-op while the last login or logout could not be fully persisted.
    pub fn refresh_from_storage(&self) {
        if self.stale_storage.get() {
            leptos::logging::log!("session storage is stale; keeping in-memory state");
            return;
        }
        match self.read_persisted() {
            Ok(next) => self.replace(next),
            Err(e) => leptos::logging::log!("session storage read skipped: {e}"),
        }
    }

    fn read_persisted(&self) -> Result<SessionState, StorageError> {
        let flag = self.storage.get(StorageArea::Durable, &self.logged_key)?;
        let name = self.storage.get(StorageArea::Durable, &self.name_key)?;
        let session_token = self.storage.get(StorageArea::Session, &self.token_key)?;
        let durable_token = self.storage.get(StorageArea::Durable, &self.token_key)?;

        let flagged = flag.is_some_and(|v| truthy(&serde_json::Value::String(v)));
        let has_token = [session_token, durable_token]
            .into_iter()
            .flatten()
            .any(|t| !t.trim().is_empty());

        if flagged || has_token {
            Ok(SessionState::logged_in(name.as_deref()))
        } else {
            Ok(SessionState::logged_out())
        }
    }

    /// Mark the user logged in, persist name and token, and announce it.
    ///
    /// A blank `name` keeps whatever name is already known.
    pub fn persist_login(
        &self,
        name: Option<&str>,
        token: Option<&str>,
        persistence: TokenPersistence,
    ) {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.stale_storage.set(false);
        self.write(StorageArea::Durable, &self.logged_key, Some(LOGGED_FLAG));
        if let Some(name) = name {
            self.write(StorageArea::Durable, &self.name_key, Some(name));
        }
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        for area in ALL_AREAS {
            let keep = token.filter(|_| persistence.areas().contains(&area));
            self.write(area, &self.token_key, keep);
        }

        let known_name = name.map(str::to_owned).or_else(|| self.known_name());
        let next = SessionState::logged_in(known_name.as_deref());
        self.replace(next.clone());
        self.bus.broadcast(SessionUpdate {
            logged: true,
            name: next.user_name().map(str::to_owned),
            email: None,
        });
    }

    /// Forget every persisted flag, name and token, and announce it.
    pub fn clear_login(&self) {
        self.apply_identity(&Identity::logged_out());
    }

    /// Store the outcome of the startup probe. Email is broadcast, not persisted.
    pub fn apply_identity(&self, identity: &Identity) {
        self.stale_storage.set(false);
        if identity.logged {
            self.write(StorageArea::Durable, &self.logged_key, Some(LOGGED_FLAG));
            if let Some(name) = identity.name.as_deref() {
                self.write(StorageArea::Durable, &self.name_key, Some(name));
            }
            let known_name = identity.name.clone().or_else(|| self.known_name());
            self.replace(SessionState::logged_in(known_name.as_deref()));
        } else {
            self.write(StorageArea::Durable, &self.logged_key, None);
            self.write(StorageArea::Durable, &self.name_key, None);
            for area in ALL_AREAS {
                self.write(area, &self.token_key, None);
            }
            self.replace(SessionState::logged_out());
        }
        self.bus.broadcast(identity.to_update());
    }

    /// React to a session notification. Returns `true` if the signal concerns
    /// the session.
    pub fn handle_signal(&self, signal: &SessionSignal) -> bool {
        let relevant = match signal {
            SessionSignal::StorageChanged { key: Some(key) } => self.owns_key(key),
            SessionSignal::StorageChanged { key: None }
            | SessionSignal::Focus
            | SessionSignal::Visible
            | SessionSignal::Broadcast(_) => true,
        };
        if relevant {
            self.refresh_from_storage();
        }
        relevant
    }

    /// Bearer token kept from an earlier login, session area first.
    pub fn persisted_token(&self) -> Option<String> {
        [StorageArea::Session, StorageArea::Durable]
            .into_iter()
            .filter_map(|area| self.storage.get(area, &self.token_key).ok().flatten())
            .map(|t| t.trim().to_owned())
            .find(|t| !t.is_empty())
    }

    /// Drop in-memory state without touching storage.
    pub fn reset(&self) {
        self.stale_storage.set(false);
        self.replace(SessionState::default());
    }

    fn known_name(&self) -> Option<String> {
        self.storage
            .get(StorageArea::Durable, &self.name_key)
            .ok()
            .flatten()
            .or_else(|| self.state().user_name().map(str::to_owned))
    }

    fn replace(&self, next: SessionState) {
        if self.state.get_untracked() != next {
            self.state.set(next);
        }
    }

    fn write(&self, area: StorageArea, key: &str, value: Option<&str>) {
        let result = match value {
            Some(v) => self.storage.set(area, key, v),
            None => self.storage.remove(area, key),
        };
        if let Err(e) = result {
            leptos::logging::log!("session storage write skipped for {key}: {e}");
            self.stale_storage.set(true);
        }
    }
}
