//! DOM event bridge for the session bus. Requires a browser environment.
//!
//! Listeners live for the whole page, so their closures are leaked with
//! `Closure::forget`.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::events::{SessionBus, SessionSignal, SessionUpdate};

/// Forward `storage`, `focus` and `visibilitychange` events onto `bus`.
pub fn install_listeners(bus: &SessionBus) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let storage_bus = bus.clone();
    let on_storage =
        Closure::<dyn FnMut(web_sys::StorageEvent)>::new(move |ev: web_sys::StorageEvent| {
            storage_bus.publish(SessionSignal::StorageChanged { key: ev.key() });
        });
    let _ = window
        .add_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref());
    on_storage.forget();

    let focus_bus = bus.clone();
    let on_focus = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        focus_bus.publish(SessionSignal::Focus);
    });
    let _ =
        window.add_event_listener_with_callback("focus", on_focus.as_ref().unchecked_ref());
    on_focus.forget();

    let Some(document) = window.document() else {
        return;
    };
    let visibility_bus = bus.clone();
    let watched = document.clone();
    let on_visibility = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        if watched.visibility_state() == web_sys::VisibilityState::Visible {
            visibility_bus.publish(SessionSignal::Visible);
        }
    });
    let _ = document.add_event_listener_with_callback(
        "visibilitychange",
        on_visibility.as_ref().unchecked_ref(),
    );
    on_visibility.forget();
}

/// Re-emit a session update as a DOM `CustomEvent` named `event_name`.
///
/// The event detail is the JSON form of [`SessionUpdate`].
pub fn dispatch_dom_event(event_name: &str, update: &SessionUpdate) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(json) = serde_json::to_string(update) else {
        return;
    };
    let detail = js_sys::JSON::parse(&json).unwrap_or(wasm_bindgen::JsValue::NULL);
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    match web_sys::CustomEvent::new_with_event_init_dict(event_name, &init) {
        Ok(event) => {
            let _ = window.dispatch_event(&event);
        }
        Err(e) => leptos::logging::warn!("session event dispatch failed: {e:?}"),
    }
}
