//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Pages validate input and hand off to the session runtime; the session
//! signal in context is the only state they read.

pub mod login;
