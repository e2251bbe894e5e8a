//! Bearer-token handling for backend calls.
//!
//! ARCHITECTURE
//! ============
//! `token` holds the short-lived access token in memory, `refresh` exchanges
//! the session cookie for a new token with at most one call in flight, and
//! `timer` is the clock seam used to bound that call.

pub mod refresh;
pub mod timer;
pub mod token;
