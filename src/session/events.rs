//! Session change notifications.
//!
//! DESIGN
//! ======
//! A small in-process pub-sub channel stands in for the browser's event
//! plumbing. DOM listeners (`storage`, `focus`, `visibilitychange`) publish
//! onto it, and same-tab writers broadcast on it because the `storage` event
//! never fires in the tab that made the change. Delivery is eventually
//! consistent: subscribers drain their queue on their own schedule.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

use super::storage::StorageChange;

/// Payload of an in-app session broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub logged: bool,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionSignal {
    /// A durable key changed in another tab; `None` when storage was cleared.
    StorageChanged { key: Option<String> },
    /// The window regained focus.
    Focus,
    /// The tab became visible.
    Visible,
    /// Same-tab login/logout/probe result.
    Broadcast(SessionUpdate),
}

impl From<StorageChange> for SessionSignal {
    fn from(change: StorageChange) -> Self {
        Self::StorageChanged { key: change.key }
    }
}

type Mirror = Rc<dyn Fn(&SessionUpdate)>;

/// Cloneable handle to the session channel.
#[derive(Clone, Default)]
pub struct SessionBus {
    subscribers: Rc<RefCell<Vec<mpsc::UnboundedSender<SessionSignal>>>>,
    mirror: Rc<RefCell<Option<Mirror>>>,
}

impl SessionBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionSignal> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Deliver `signal` to every live subscriber, dropping closed ones.
    pub fn publish(&self, signal: SessionSignal) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(signal.clone()).is_ok());
    }

    /// Publish a session update and forward it to the mirror, if any.
    pub fn broadcast(&self, update: SessionUpdate) {
        let mirror = self.mirror.borrow().clone();
        if let Some(mirror) = mirror {
            mirror(&update);
        }
        self.publish(SessionSignal::Broadcast(update));
    }

    /// Also hand every broadcast to `mirror` (e.g. to re-emit it as a DOM event).
    pub fn set_mirror(&self, mirror: impl Fn(&SessionUpdate) + 'static) {
        *self.mirror.borrow_mut() = Some(Rc::new(mirror));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}
