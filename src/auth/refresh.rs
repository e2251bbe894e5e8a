//! Token refresh coordination.
//!
//! DESIGN
//! ======
//! At most one `POST /auth/refresh.php` is outstanding at any time. Callers
//! that arrive while it is in flight park a oneshot sender in `waiters` and
//! receive the same outcome as the caller that issued the request.
//!
//! The outstanding flag and the waiter queue are cleared *before* waiters are
//! resolved, so a refresh requested right after completion issues a new call
//! instead of joining the finished batch.
//!
//! TRADE-OFFS
//! ==========
//! Every call is raced against `refresh_timeout`. A hung backend therefore
//! costs each batch one timeout instead of blocking all future refreshes.
//! If the issuing future is dropped mid-call, the batch settles as failed.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use std::cell::RefCell;
use std::pin::pin;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{Either, select};

use super::timer::Timer;
use super::token::AccessToken;
use crate::net::api::{LOGOUT_PATH, REFRESH_PATH, RefreshResponse};
use crate::net::http::{ApiError, ApiRequest, ApiResponse, HttpTransport};

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<bool>>,
}

pub struct RefreshCoordinator<T, C> {
    transport: Rc<T>,
    timer: C,
    token: AccessToken,
    timeout: Duration,
    state: Rc<RefCell<RefreshState>>,
}

impl<T: HttpTransport, C: Timer> RefreshCoordinator<T, C> {
    pub fn new(transport: Rc<T>, timer: C, token: AccessToken, timeout: Duration) -> Self {
        Self {
            transport,
            timer,
            token,
            timeout,
            state: Rc::default(),
        }
    }

    /// Current bearer token, if any.
    pub fn get_access(&self) -> Option<String> {
        self.token.get()
    }

    pub fn set_access(&self, token: Option<String>) {
        self.token.set(token);
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.borrow().refreshing
    }

    /// Number of callers parked behind the outstanding refresh.
    pub fn waiting(&self) -> usize {
        self.state.borrow().waiters.len()
    }

    /// Obtain a fresh access token, joining an in-flight refresh if one exists.
    ///
    /// Resolves `true` when a new token is stored. Any failure clears the
    /// token and resolves `false` for every caller in the batch.
    pub async fn refresh(&self) -> bool {
        let parked = {
            let mut state = self.state.borrow_mut();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };
        if let Some(rx) = parked {
            return rx.await.unwrap_or(false);
        }

        let mut batch = Batch {
            state: Rc::clone(&self.state),
            settled: false,
        };
        let outcome = self.call_refresh().await;
        batch.settle(outcome);
        outcome
    }

    async fn call_refresh(&self) -> bool {
        let request = ApiRequest::post(REFRESH_PATH);
        let call = pin!(self.transport.send(&request));
        let result = match select(call, self.timer.sleep(self.timeout)).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ApiError::Timeout),
        };
        match granted_token(result) {
            Ok(token) => {
                self.token.set(Some(token));
                true
            }
            Err(e) => {
                leptos::logging::warn!("token refresh failed: {e}");
                self.token.clear();
                false
            }
        }
    }

    /// Drop the token and tell the backend to end the session. Best effort.
    pub async fn logout(&self) {
        self.token.clear();
        if let Err(e) = self.transport.send(&ApiRequest::post(LOGOUT_PATH)).await {
            leptos::logging::log!("logout request failed: {e}");
        }
    }

    /// Forget the token and fail any parked waiters.
    ///
    /// A call already in flight stays owned by its issuer: `refreshing` is
    /// left set, so later callers join that call instead of issuing another.
    pub fn reset(&self) {
        self.token.clear();
        let parked = std::mem::take(&mut self.state.borrow_mut().waiters);
        for waiter in parked {
            let _ = waiter.send(false);
        }
    }
}

/// Settles the batch exactly once, including when the issuing future is dropped.
struct Batch {
    state: Rc<RefCell<RefreshState>>,
    settled: bool,
}

impl Batch {
    fn settle(&mut self, outcome: bool) {
        self.settled = true;
        let waiters = {
            let mut state = self.state.borrow_mut();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(outcome);
        }
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(false);
        }
    }
}

fn granted_token(result: Result<ApiResponse, ApiError>) -> Result<String, ApiError> {
    let resp = result?.error_for_status()?;
    let body: RefreshResponse = resp.json()?;
    body.granted_token()
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Rejected("refresh returned no access token".to_owned()))
}
