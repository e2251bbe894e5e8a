//! Startup probe of the backend session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs once when the app starts. It only *discovers* whether the session
//! cookie belongs to a logged-in member; it never establishes a session.
//!
//! ERROR HANDLING
//! ==============
//! Fails safe to logged-out. A broken `whoami` call means "not logged in"; a
//! broken profile call only leaves name/email unknown. Nothing is returned as
//! an error. Both calls go straight to the transport, bypassing the
//! refresh-on-401 interceptor, since a 401 here is an answer, not a failure.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use super::probe::{Identity, RawRecord, normalize_whoami};
use super::store::LocalSessionStore;
use crate::net::api::{PROFILE_PATH, WHOAMI_PATH};
use crate::net::http::{ApiRequest, HttpTransport};

/// Probe the backend, write the result into `store`, and broadcast it.
///
/// The resolved identity is returned for diagnostics; callers normally ignore it.
pub async fn bootstrap_session<T: HttpTransport>(
    transport: &T,
    store: &LocalSessionStore,
) -> Identity {
    let mut identity = probe_identity(transport).await;
    if identity.needs_profile() {
        if let Some(profile) = fetch_profile(transport).await {
            identity.merge_profile(&profile);
        }
    }
    store.apply_identity(&identity);
    identity
}

async fn probe_identity<T: HttpTransport>(transport: &T) -> Identity {
    match transport.send(&ApiRequest::get(WHOAMI_PATH)).await {
        Ok(resp) if resp.is_success() => normalize_whoami(&RawRecord::from_body(&resp.body)),
        Ok(resp) => {
            leptos::logging::log!("whoami answered {}; treating as logged out", resp.status);
            Identity::logged_out()
        }
        Err(e) => {
            leptos::logging::warn!("whoami failed: {e}; treating as logged out");
            Identity::logged_out()
        }
    }
}

async fn fetch_profile<T: HttpTransport>(transport: &T) -> Option<RawRecord> {
    match transport.send(&ApiRequest::get(PROFILE_PATH)).await {
        Ok(resp) if resp.is_success() => Some(RawRecord::from_body(&resp.body)),
        Ok(resp) => {
            leptos::logging::log!("profile fetch answered {}", resp.status);
            None
        }
        Err(e) => {
            leptos::logging::warn!("profile fetch failed: {e}");
            None
        }
    }
}
