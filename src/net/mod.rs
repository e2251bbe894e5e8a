//! Networking modules for the remote membership backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` defines the transport seam and wire primitives, `api` names the
//! endpoints and their payloads, and `interceptor` wraps every outgoing call
//! with bearer-token injection and the single refresh-and-retry cycle.

pub mod api;
pub mod http;
pub mod interceptor;

#[cfg(test)]
pub(crate) mod mock;
