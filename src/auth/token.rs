//! In-memory access token holder.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to the current bearer token.
///
/// Clones observe the same slot. Only the refresh coordinator and the login
/// flow write it; everything else reads.
#[derive(Clone, Debug, Default)]
pub struct AccessToken {
    slot: Rc<RefCell<Option<String>>>,
}

impl AccessToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Overwrite the token. Blank values clear it.
    pub fn set(&self, token: Option<String>) {
        let token = token.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());
        *self.slot.borrow_mut() = token;
    }

    pub fn clear(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_present(&self) -> bool {
        self.slot.borrow().is_some()
    }
}
