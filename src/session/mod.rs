//! Session state for the current visitor.
//!
//! ARCHITECTURE
//! ============
//! `store` is the only writer of [`state::SessionState`]; `bootstrap` feeds it
//! the backend's answer on startup through the lenient parsers in `probe`.
//! `events` carries cross-component and cross-tab change notifications, and
//! `browser` turns DOM events into those notifications in the WASM build.

pub mod bootstrap;
#[cfg(feature = "hydrate")]
pub mod browser;
pub mod events;
pub mod probe;
pub mod state;
pub mod storage;
pub mod store;
