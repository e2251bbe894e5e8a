//! Per-browser key/value persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two areas exist: `Session` (tab-scoped, `sessionStorage`) and `Durable`
//! (shared by every tab of the origin, `localStorage`). Only durable writes
//! are announced to other tabs.
//!
//! TRADE-OFFS
//! ==========
//! Every operation is fallible because private browsing and quota limits make
//! storage unreliable. Callers treat failures as best-effort misses; the
//! in-memory session state stays authoritative for the current tab.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::channel::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Session,
    Durable,
}

/// Where a bearer token obtained at login is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenPersistence {
    /// Tab-scoped storage only.
    SessionOnly,
    /// Tab-scoped and durable storage.
    SessionAndDurable,
    /// Memory only.
    #[default]
    None,
}

impl TokenPersistence {
    pub fn areas(self) -> &'static [StorageArea] {
        match self {
            Self::SessionOnly => &[StorageArea::Session],
            Self::SessionAndDurable => &[StorageArea::Session, StorageArea::Durable],
            Self::None => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage rejected write: {0}")]
    Rejected(String),
}

pub trait KeyValueStorage {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the area cannot be accessed.
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the area is unavailable or rejects the write.
    fn set(&self, area: StorageArea, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the area cannot be accessed.
    fn remove(&self, area: StorageArea, key: &str) -> Result<(), StorageError>;
}

/// A durable key changed in another tab. `key: None` means the area was cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    pub key: Option<String>,
}

#[derive(Default)]
struct SharedDurable {
    items: BTreeMap<String, String>,
    watchers: Vec<(u64, mpsc::UnboundedSender<StorageChange>)>,
    next_tab: u64,
}

/// In-process storage with browser-like semantics.
///
/// Handles opened with [`MemoryStorage::open_tab`] share the durable area but
/// own their session area, and durable changes are reported to watchers of
/// *other* tabs only, mirroring the `storage` event.
pub struct MemoryStorage {
    durable: Rc<RefCell<SharedDurable>>,
    session: RefCell<BTreeMap<String, String>>,
    tab: u64,
    unavailable: Cell<bool>,
    quota_full: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            durable: Rc::default(),
            session: RefCell::default(),
            tab: 0,
            unavailable: Cell::new(false),
            quota_full: Cell::new(false),
        }
    }

    /// Another tab of the same origin.
    pub fn open_tab(&self) -> Self {
        let tab = {
            let mut shared = self.durable.borrow_mut();
            shared.next_tab += 1;
            shared.next_tab
        };
        Self {
            durable: Rc::clone(&self.durable),
            session: RefCell::default(),
            tab,
            unavailable: Cell::new(false),
            quota_full: Cell::new(false),
        }
    }

    /// Subscribe to durable changes made by other tabs.
    pub fn watch(&self) -> mpsc::UnboundedReceiver<StorageChange> {
        let (tx, rx) = mpsc::unbounded();
        self.durable.borrow_mut().watchers.push((self.tab, tx));
        rx
    }

    /// Simulate private browsing: every operation on this handle fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Simulate a full quota: `set` fails on this handle, reads and removals work.
    pub fn set_quota_full(&self, full: bool) {
        self.quota_full.set(full);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn write_durable(&self, key: &str, value: Option<&str>) {
        let mut shared = self.durable.borrow_mut();
        let previous = match value {
            Some(v) => shared.items.insert(key.to_owned(), v.to_owned()),
            None => shared.items.remove(key),
        };
        if previous.as_deref() == value {
            return;
        }
        let writer = self.tab;
        shared.watchers.retain(|(tab, tx)| {
            let change = StorageChange {
                key: Some(key.to_owned()),
            };
            *tab == writer || tx.unbounded_send(change).is_ok()
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(match area {
            StorageArea::Session => self.session.borrow().get(key).cloned(),
            StorageArea::Durable => self.durable.borrow().items.get(key).cloned(),
        })
    }

    fn set(&self, area: StorageArea, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        if self.quota_full.get() {
            return Err(StorageError::Rejected("QuotaExceededError".to_owned()));
        }
        match area {
            StorageArea::Session => {
                self.session.borrow_mut().insert(key.to_owned(), value.to_owned());
            }
            StorageArea::Durable => self.write_durable(key, Some(value)),
        }
        Ok(())
    }

    fn remove(&self, area: StorageArea, key: &str) -> Result<(), StorageError> {
        self.check()?;
        match area {
            StorageArea::Session => {
                self.session.borrow_mut().remove(key);
            }
            StorageArea::Durable => self.write_durable(key, None),
        }
        Ok(())
    }
}

/// `sessionStorage`/`localStorage` of the current window.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

#[cfg(feature = "hydrate")]
impl BrowserStorage {
    fn area(area: StorageArea) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        let storage = match area {
            StorageArea::Session => window.session_storage(),
            StorageArea::Durable => window.local_storage(),
        };
        storage.ok().flatten().ok_or(StorageError::Unavailable)
    }
}

#[cfg(feature = "hydrate")]
impl KeyValueStorage for BrowserStorage {
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<String>, StorageError> {
        Self::area(area)?.get_item(key).map_err(|_| StorageError::Unavailable)
    }

    fn set(&self, area: StorageArea, key: &str, value: &str) -> Result<(), StorageError> {
        Self::area(area)?
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }

    fn remove(&self, area: StorageArea, key: &str) -> Result<(), StorageError> {
        Self::area(area)?.remove_item(key).map_err(|_| StorageError::Unavailable)
    }
}
