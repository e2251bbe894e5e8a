//! Authenticated request path.
//!
//! DESIGN
//! ======
//! Every non-auth request gets `Authorization: Bearer <token>` when a token is
//! held. A 401 triggers one refresh and, if that yields a token, one retry.
//! The retry's answer is final even if it is another 401: a backend that keeps
//! rejecting must not put the client in a loop.
//!
//! Login, refresh and logout bypass all of this. They travel on the session
//! cookie alone, and a 401 from refresh must never trigger another refresh.

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod interceptor_test;

use std::rc::Rc;

use super::api::{LOGIN_PATH, LoginRequest, LoginResponse, is_auth_endpoint};
use super::http::{ApiError, ApiRequest, ApiResponse, HttpTransport};
use crate::auth::refresh::RefreshCoordinator;
use crate::auth::timer::Timer;
use crate::session::state::SessionState;
use crate::session::storage::TokenPersistence;
use crate::session::store::LocalSessionStore;

pub struct AuthClient<T, C> {
    transport: Rc<T>,
    refresher: Rc<RefreshCoordinator<T, C>>,
    store: Rc<LocalSessionStore>,
}

impl<T: HttpTransport, C: Timer> AuthClient<T, C> {
    pub fn new(
        transport: Rc<T>,
        refresher: Rc<RefreshCoordinator<T, C>>,
        store: Rc<LocalSessionStore>,
    ) -> Self {
        Self {
            transport,
            refresher,
            store,
        }
    }

    /// Send `request` with token injection and a single refresh-and-retry.
    ///
    /// # Errors
    ///
    /// Transport errors are returned unchanged. HTTP error statuses, including a
    /// final 401, come back as `Ok(ApiResponse)`.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if is_auth_endpoint(&request.path) {
            return self.transport.send(&request).await;
        }

        let first = self.transport.send(&self.authorize(request.clone())).await?;
        if !first.is_unauthorized() {
            return Ok(first);
        }

        if !self.refresher.refresh().await {
            return Ok(first);
        }
        let Some(token) = self.refresher.get_access() else {
            return Ok(first);
        };
        let mut retry = request;
        retry.set_bearer(&token);
        self.transport.send(&retry).await
    }

    /// Send and decode a JSON body, treating any non-2xx status as an error.
    ///
    /// # Errors
    ///
    /// Returns transport errors, `ApiError::Status`, or `ApiError::Decode`.
    pub async fn send_json<R: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, ApiError> {
        self.send(request).await?.error_for_status()?.json()
    }

    fn authorize(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(token) = self.refresher.get_access() {
            request.set_bearer(&token);
        }
        request
    }

    /// Log in with email and password.
    ///
    /// On success the token is held in memory, persisted per `persistence`, and
    /// the session store announces the login.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the credentials,
    /// `ApiError::Status` for other failures, or the transport error.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        persistence: TokenPersistence,
    ) -> Result<SessionState, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(&LoginRequest { email, password })?;
        let resp = self.transport.send(&request).await?;
        let body = resp.json::<LoginResponse>().unwrap_or_default();

        if !resp.is_success() && body.error.is_none() && body.message.is_none() {
            return Err(ApiError::Status {
                status: resp.status,
                body: resp.body,
            });
        }
        if !resp.is_success() || !body.ok {
            return Err(ApiError::Rejected(body.failure_message()));
        }

        self.refresher.set_access(body.access_token.clone());
        let token = self.refresher.get_access();
        self.store
            .persist_login(body.display_name(), token.as_deref(), persistence);
        Ok(self.store.state())
    }

    /// End the session remotely (best effort) and locally.
    pub async fn logout(&self) {
        self.refresher.logout().await;
        self.store.clear_login();
    }
}
