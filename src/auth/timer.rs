//! Clock seam for bounding network calls.
//!
//! TRADE-OFFS
//! ==========
//! `fetch` has no native timeout, so deadlines are raced against a timer
//! future instead. The in-flight request is dropped, not aborted.

use std::time::Duration;

use futures::future::LocalBoxFuture;

pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Browser timer backed by `setTimeout`.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTimer;

#[cfg(feature = "hydrate")]
impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TokioTimer;

#[cfg(test)]
impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}
