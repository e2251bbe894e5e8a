//! Client configuration resolved from the page host.
//!
//! SYSTEM CONTEXT
//! ==============
//! The same WASM bundle is served from a local development host and from the
//! production site. Local hosts talk to the backend directly; production goes
//! through the same-origin `/api` reverse proxy of the hosting shell.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::session::storage::TokenPersistence;

pub const DEFAULT_DEV_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_PROD_API_BASE: &str = "/api";
pub const DEFAULT_STORAGE_PREFIX: &str = "asoc:";
pub const DEFAULT_BROADCAST_EVENT: &str = "asoc:session-changed";
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 15;

/// Build-time override for the API base (`SOCIOS_API_BASE=... trunk build`).
const API_BASE_OVERRIDE: Option<&str> = option_env!("SOCIOS_API_BASE");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to. Never ends with `/`.
    pub api_base: String,
    /// Namespace for every durable storage key this client owns.
    pub storage_prefix: String,
    /// Name of the DOM event mirrored on every session change.
    pub broadcast_event: String,
    /// Upper bound on a single refresh network call.
    pub refresh_timeout: Duration,
    /// Where bearer tokens from login are persisted by default.
    pub token_persistence: TokenPersistence,
}

impl ClientConfig {
    /// Resolve configuration for a page served from `host` (`location.host`).
    pub fn for_host(host: &str) -> Self {
        let api_base = resolve_api_base(API_BASE_OVERRIDE, host);
        Self {
            api_base,
            ..Self::default()
        }
    }

    /// Same as [`ClientConfig::for_host`], reading the host from `window.location`.
    #[cfg(feature = "hydrate")]
    pub fn from_window() -> Self {
        let host = web_sys::window()
            .and_then(|w| w.location().host().ok())
            .unwrap_or_default();
        Self::for_host(&host)
    }

    /// Durable key holding the login flag.
    pub fn logged_key(&self) -> String {
        format!("{}isLoggedIn", self.storage_prefix)
    }

    /// Durable key holding the display name.
    pub fn name_key(&self) -> String {
        format!("{}userName", self.storage_prefix)
    }

    /// Key holding a persisted bearer token (session or durable area).
    pub fn token_key(&self) -> String {
        format!("{}accessToken", self.storage_prefix)
    }

    /// Full URL for an endpoint path such as `/auth/whoami.php`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_PROD_API_BASE.to_owned(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_owned(),
            broadcast_event: DEFAULT_BROADCAST_EVENT.to_owned(),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            token_persistence: TokenPersistence::None,
        }
    }
}

fn resolve_api_base(override_base: Option<&str>, host: &str) -> String {
    let base = match override_base.map(str::trim).filter(|v| !v.is_empty()) {
        Some(explicit) => explicit,
        None if is_dev_host(host) => DEFAULT_DEV_API_BASE,
        None => DEFAULT_PROD_API_BASE,
    };
    base.trim_end_matches('/').to_owned()
}

/// `true` for loopback and `.local` hosts, with or without a port.
pub(crate) fn is_dev_host(host: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    let hostname = if host.starts_with('[') {
        host.split_once(']').map_or(host.as_str(), |(h, _)| h).trim_start_matches('[')
    } else {
        host.split(':').next().unwrap_or_default()
    };
    matches!(hostname, "localhost" | "127.0.0.1" | "::1") || hostname.ends_with(".local")
}
