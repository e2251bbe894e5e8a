use std::rc::Rc;

use futures::{FutureExt, StreamExt};

use super::*;
use crate::config::ClientConfig;
use crate::net::mock::ScriptedTransport;
use crate::session::events::{SessionBus, SessionSignal};
use crate::session::storage::{KeyValueStorage, MemoryStorage, StorageArea};

fn fixture() -> (ScriptedTransport, Rc<MemoryStorage>, LocalSessionStore, SessionBus) {
    let storage = Rc::new(MemoryStorage::new());
    let bus = SessionBus::new();
    let store = LocalSessionStore::new(
        &ClientConfig::default(),
        Rc::clone(&storage) as Rc<dyn KeyValueStorage>,
        bus.clone(),
    );
    (ScriptedTransport::new(), storage, store, bus)
}

#[tokio::test]
async fn network_failure_leaves_user_logged_out() {
    let (transport, storage, store, _) = fixture();
    storage.set(StorageArea::Durable, "asoc:isLoggedIn", "1").unwrap();
    transport.fail(WHOAMI_PATH);

    let identity = bootstrap_session(&transport, &store).await;

    assert_eq!(identity, Identity::logged_out());
    assert!(!store.state().is_logged_in());
    assert_eq!(store.state().user_name(), None);
    assert_eq!(storage.get(StorageArea::Durable, "asoc:isLoggedIn").unwrap(), None);
    assert_eq!(transport.calls_to(PROFILE_PATH), 0);
}

#[tokio::test]
async fn session_id_only_response_is_logged_out() {
    let (transport, _, store, _) = fixture();
    transport.respond(WHOAMI_PATH, 200, r#"{"session_id":"abc"}"#);

    let identity = bootstrap_session(&transport, &store).await;

    assert!(!identity.logged);
    assert!(!store.state().is_logged_in());
}

#[tokio::test]
async fn unauthorized_whoami_is_logged_out_without_profile_call() {
    let (transport, _, store, _) = fixture();
    transport.respond(WHOAMI_PATH, 401, "");

    bootstrap_session(&transport, &store).await;

    assert!(!store.state().is_logged_in());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn complete_whoami_skips_profile() {
    let (transport, _, store, _) = fixture();
    transport.respond(WHOAMI_PATH, 200, r#"{"ok":true,"name":"Ana García","email":"ana@x.es"}"#);

    let identity = bootstrap_session(&transport, &store).await;

    assert_eq!(identity.email.as_deref(), Some("ana@x.es"));
    assert_eq!(store.state().user_initials(), Some("AN"));
    assert_eq!(transport.calls_to(PROFILE_PATH), 0);
}

#[tokio::test]
async fn missing_fields_are_filled_from_profile() {
    let (transport, storage, store, bus) = fixture();
    let mut rx = bus.subscribe();
    transport.respond(WHOAMI_PATH, 200, r#"{"uid":7}"#);
    transport.respond(
        PROFILE_PATH,
        200,
        r#"{"socio":{"nombre":"Luis","apellido1":"Pérez","email":"luis@x.es"}}"#,
    );

    let identity = bootstrap_session(&transport, &store).await;

    assert_eq!(identity.name.as_deref(), Some("Luis Pérez"));
    assert_eq!(
        storage.get(StorageArea::Durable, "asoc:userName").unwrap().as_deref(),
        Some("Luis Pérez")
    );
    assert_eq!(store.state().user_initials(), Some("LU"));
    assert_eq!(
        rx.next().now_or_never(),
        Some(Some(SessionSignal::Broadcast(identity.to_update())))
    );
}

#[tokio::test]
async fn profile_failure_keeps_logged_in_without_name() {
    let (transport, _, store, _) = fixture();
    transport.respond(WHOAMI_PATH, 200, "1");
    transport.fail(PROFILE_PATH);

    let identity = bootstrap_session(&transport, &store).await;

    assert!(identity.logged);
    assert!(store.state().is_logged_in());
    assert_eq!(store.state().user_name(), None);
    assert_eq!(store.state().badge_label().as_deref(), Some("?"));
}

#[tokio::test]
async fn identity_requests_are_plain_gets() {
    let (transport, _, store, _) = fixture();
    transport.respond(WHOAMI_PATH, 200, r#"{"logged":true}"#);
    transport.respond(PROFILE_PATH, 500, "");

    bootstrap_session(&transport, &store).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method == crate::net::http::Method::Get));
    assert!(requests.iter().all(|r| r.header("Authorization").is_none()));
}
