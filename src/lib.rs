//! # socios-web
//!
//! Leptos + WASM client for the association's membership site.
//!
//! The crate owns the browser-side session machinery: discovering whether the
//! visitor is logged in, keeping that answer in sync across tabs, holding the
//! short-lived bearer token, and coordinating token refresh for outgoing API
//! calls. Pages and components are a thin layer over that core.
//!
//! SYSTEM CONTEXT
//! ==============
//! All persistence and authentication truth live in the remote membership
//! backend. The `hydrate` build talks to it through `gloo-net`; native builds
//! (tests, SSR) swap in other `HttpTransport`/`KeyValueStorage` implementations.

pub mod app;
pub mod auth;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod runtime;
pub mod session;

/// Browser entry point: installs panic/log hooks and hydrates the SSR markup.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
