//! Scripted transport for tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use super::http::{ApiError, ApiRequest, ApiResponse, HttpTransport};

/// Replays queued responses per endpoint path and records every request.
///
/// Each call yields to the runtime once before answering so concurrent callers
/// genuinely overlap.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: RefCell<HashMap<String, VecDeque<Result<ApiResponse, ApiError>>>>,
    hanging: RefCell<HashSet<String>>,
    log: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, status: u16, body: &str) {
        self.push(path, Ok(ApiResponse::new(status, body)));
    }

    pub(crate) fn fail(&self, path: &str) {
        self.push(path, Err(ApiError::Network("connection refused".to_owned())));
    }

    /// Requests to `path` never complete.
    pub(crate) fn hang(&self, path: &str) {
        self.hanging.borrow_mut().insert(path.to_owned());
    }

    pub(crate) fn push(&self, path: &str, result: Result<ApiResponse, ApiError>) {
        self.routes
            .borrow_mut()
            .entry(path.to_owned())
            .or_default()
            .push_back(result);
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.log.borrow().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.log.borrow().iter().filter(|r| r.path == path).count()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.log.borrow_mut().push(request.clone());
        if self.hanging.borrow().contains(&request.path) {
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;
        let next = self
            .routes
            .borrow_mut()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| {
            Err(ApiError::Network(format!(
                "no scripted response for {}",
                request.path
            )))
        })
    }
}
