//! Endpoint paths and wire payloads of the membership backend.
//!
//! DESIGN
//! ======
//! Auth endpoints (login, refresh, logout) are classified here so the
//! interceptor can keep them out of token injection and refresh-on-401;
//! otherwise a failing refresh would recurse into itself.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::{Deserialize, Serialize};

pub const WHOAMI_PATH: &str = "/auth/whoami.php";
pub const PROFILE_PATH: &str = "/socios/socios_me.php";
pub const LOGIN_PATH: &str = "/auth/login.php";
pub const REFRESH_PATH: &str = "/auth/refresh.php";
pub const LOGOUT_PATH: &str = "/auth/logout.php";

const AUTH_PATHS: [&str; 3] = [LOGIN_PATH, REFRESH_PATH, LOGOUT_PATH];

/// `true` when `path` targets login, refresh or logout (query string ignored).
pub fn is_auth_endpoint(path: &str) -> bool {
    let bare = path.split(['?', '#']).next().unwrap_or_default();
    AUTH_PATHS.iter().any(|auth| bare.ends_with(auth))
}

/// Body of `POST /auth/refresh.php`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl RefreshResponse {
    /// The new token, if the backend granted one.
    pub fn granted_token(&self) -> Option<&str> {
        if self.ok == Some(false) {
            return None;
        }
        self.access_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Body of `POST /auth/login.php`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    pub fn display_name(&self) -> Option<&str> {
        [self.name.as_deref(), self.nombre.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|n| !n.is_empty())
    }

    pub fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("login rejected")
            .to_owned()
    }
}
