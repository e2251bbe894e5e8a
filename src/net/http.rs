//! HTTP primitives and the transport seam.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, always credentialed
//! so the backend session cookie travels with every request.
//! Native builds (tests, SSR) supply their own [`HttpTransport`].
//!
//! ERROR HANDLING
//! ==============
//! Transport failures are `ApiError::Network`. Non-2xx statuses are *not*
//! errors at this layer: the interceptor needs to see a 401 as a response,
//! and callers opt into status errors with [`ApiResponse::error_for_status`].

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An outgoing request addressed by endpoint path (relative to the API base).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attach a JSON body and the matching content type.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the payload cannot be serialized.
    pub fn json<T: Serialize>(mut self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.set_header("Content-Type", "application/json");
        self.body = Some(body);
        Ok(self)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Insert or replace a header (names compare case-insensitively).
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_bearer(&mut self, token: &str) {
        self.set_header(AUTHORIZATION, &format!("Bearer {token}"));
    }
}

/// A completed HTTP exchange. The body is kept as text so lenient parsers can
/// inspect shapes that are not valid JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Parse the body as untyped JSON, `None` if it is not JSON.
    pub fn value(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.body.trim()).ok()
    }

    /// Convert a non-2xx response into `ApiError::Status`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` carrying status and body when not successful.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Errors produced by backend calls.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (offline, CORS, DNS, aborted).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("request failed: status {status}")]
    Status { status: u16, body: String },

    /// A request or response body could not be (de)serialized.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The backend answered but refused the operation (`ok: false`).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The call did not finish within its time budget.
    #[error("request timed out")]
    Timeout,
}

/// Sends requests to the membership backend.
///
/// Implementations must include credentials (cookies) on every call and must
/// report any status, including 401, as `Ok(ApiResponse)`.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Browser transport backed by `fetch` through `gloo-net`.
#[cfg(feature = "hydrate")]
#[derive(Clone, Debug)]
pub struct GlooTransport {
    api_base: String,
}

#[cfg(feature = "hydrate")]
impl GlooTransport {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }
}

#[cfg(feature = "hydrate")]
impl HttpTransport for GlooTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.api_base, request.path);
        let mut builder = match request.method {
            Method::Get => gloo_net::http::Request::get(&url),
            Method::Post => gloo_net::http::Request::post(&url),
        }
        .credentials(web_sys::RequestCredentials::Include);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let outgoing = match &request.body {
            Some(body) => builder.body(body.clone()),
            None => builder.build(),
        }
        .map_err(|e| ApiError::Network(e.to_string()))?;

        let resp = outgoing
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}
