use std::time::Duration;

use super::*;
use crate::auth::timer::TokioTimer;
use crate::auth::token::AccessToken;
use crate::config::ClientConfig;
use crate::net::api::{LOGOUT_PATH, REFRESH_PATH};
use crate::net::mock::ScriptedTransport;
use crate::session::events::SessionBus;
use crate::session::storage::{KeyValueStorage, MemoryStorage, StorageArea};

const DATA_PATH: &str = "/viajes/preferencias.php";

struct Fixture {
    transport: Rc<ScriptedTransport>,
    storage: Rc<MemoryStorage>,
    refresher: Rc<RefreshCoordinator<ScriptedTransport, TokioTimer>>,
    client: AuthClient<ScriptedTransport, TokioTimer>,
}

fn fixture() -> Fixture {
    let transport = Rc::new(ScriptedTransport::new());
    let storage = Rc::new(MemoryStorage::new());
    let refresher = Rc::new(RefreshCoordinator::new(
        Rc::clone(&transport),
        TokioTimer,
        AccessToken::new(),
        Duration::from_secs(15),
    ));
    let store = Rc::new(LocalSessionStore::new(
        &ClientConfig::default(),
        Rc::clone(&storage) as Rc<dyn KeyValueStorage>,
        SessionBus::new(),
    ));
    let client = AuthClient::new(Rc::clone(&transport), Rc::clone(&refresher), store);
    Fixture {
        transport,
        storage,
        refresher,
        client,
    }
}

fn bearer_of(req: &ApiRequest) -> Option<&str> {
    req.header("Authorization")
}

// =============================================================
// token injection
// =============================================================

#[tokio::test]
async fn attaches_bearer_when_token_present() {
    let fx = fixture();
    fx.refresher.set_access(Some("t1".to_owned()));
    fx.transport.respond(DATA_PATH, 200, "{}");

    let resp = fx.client.send(ApiRequest::get(DATA_PATH)).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(bearer_of(&fx.transport.requests()[0]), Some("Bearer t1"));
}

#[tokio::test]
async fn sends_without_header_when_no_token() {
    let fx = fixture();
    fx.transport.respond(DATA_PATH, 200, "{}");

    fx.client.send(ApiRequest::get(DATA_PATH)).await.unwrap();

    assert_eq!(bearer_of(&fx.transport.requests()[0]), None);
}

#[tokio::test]
async fn auth_endpoints_bypass_injection_and_refresh() {
    let fx = fixture();
    fx.refresher.set_access(Some("t1".to_owned()));
    fx.transport.respond(REFRESH_PATH, 401, "");

    let resp = fx.client.send(ApiRequest::post(REFRESH_PATH)).await.unwrap();

    assert_eq!(resp.status, 401);
    assert_eq!(fx.transport.calls_to(REFRESH_PATH), 1);
    assert_eq!(bearer_of(&fx.transport.requests()[0]), None);
}

// =============================================================
// refresh and retry
// =============================================================

#[tokio::test]
async fn unauthorized_refreshes_and_retries_with_new_token() {
    let fx = fixture();
    fx.refresher.set_access(Some("old".to_owned()));
    fx.transport.respond(DATA_PATH, 401, "");
    fx.transport.respond(REFRESH_PATH, 200, r#"{"ok":true,"access_token":"new"}"#);
    fx.transport.respond(DATA_PATH, 200, r#"{"saved":true}"#);

    let resp = fx.client.send(ApiRequest::get(DATA_PATH)).await.unwrap();

    assert_eq!(resp.status, 200);
    let requests = fx.transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(bearer_of(&requests[0]), Some("Bearer old"));
    assert_eq!(bearer_of(&requests[2]), Some("Bearer new"));
}

#[tokio::test]
async fn failed_refresh_forwards_original_401() {
    let fx = fixture();
    fx.transport.respond(DATA_PATH, 401, "expired");
    fx.transport.respond(REFRESH_PATH, 403, "");

    let resp = fx.client.send(ApiRequest::get(DATA_PATH)).await.unwrap();

    assert_eq!(resp, ApiResponse::new(401, "expired"));
    assert_eq!(fx.transport.calls_to(DATA_PATH), 1);
    assert_eq!(fx.refresher.get_access(), None);
}

#[tokio::test]
async fn second_401_after_refresh_is_not_retried_again() {
    let fx = fixture();
    fx.transport.respond(DATA_PATH, 401, "first");
    fx.transport.respond(REFRESH_PATH, 200, r#"{"ok":true,"access_token":"new"}"#);
    fx.transport.respond(DATA_PATH, 401, "second");

    let resp = fx.client.send(ApiRequest::get(DATA_PATH)).await.unwrap();

    assert_eq!(resp, ApiResponse::new(401, "second"));
    assert_eq!(fx.transport.calls_to(DATA_PATH), 2);
    assert_eq!(fx.transport.calls_to(REFRESH_PATH), 1);
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh() {
    let fx = fixture();
    for _ in 0..3 {
        fx.transport.respond(DATA_PATH, 401, "");
    }
    fx.transport.respond(REFRESH_PATH, 200, r#"{"ok":true,"access_token":"new"}"#);
    for _ in 0..3 {
        fx.transport.respond(DATA_PATH, 200, "{}");
    }

    let (a, b, c) = tokio::join!(
        fx.client.send(ApiRequest::get(DATA_PATH)),
        fx.client.send(ApiRequest::get(DATA_PATH)),
        fx.client.send(ApiRequest::get(DATA_PATH)),
    );

    assert_eq!([a.unwrap().status, b.unwrap().status, c.unwrap().status], [200, 200, 200]);
    assert_eq!(fx.transport.calls_to(REFRESH_PATH), 1);
}

#[tokio::test]
async fn transport_errors_are_forwarded_without_refresh() {
    let fx = fixture();
    fx.transport.fail(DATA_PATH);

    let err = fx.client.send(ApiRequest::get(DATA_PATH)).await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(fx.transport.calls_to(REFRESH_PATH), 0);
}

#[tokio::test]
async fn send_json_decodes_success_and_surfaces_status() {
    let fx = fixture();
    fx.transport.respond(DATA_PATH, 200, r#"{"n":3}"#);
    fx.transport.respond(DATA_PATH, 500, "boom");

    let ok: serde_json::Value = fx.client.send_json(ApiRequest::get(DATA_PATH)).await.unwrap();
    assert_eq!(ok["n"], 3);

    let err =
        fx.client.send_json::<serde_json::Value>(ApiRequest::get(DATA_PATH)).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 500,
            body: "boom".to_owned()
        }
    );
}

// =============================================================
// login / logout
// =============================================================

#[tokio::test]
async fn login_stores_token_and_marks_session() {
    let fx = fixture();
    fx.transport.respond(
        LOGIN_PATH,
        200,
        r#"{"ok":true,"access_token":"tok","nombre":"Ana García"}"#,
    );

    let state = fx
        .client
        .login("ana@x.es", "secreto", TokenPersistence::SessionOnly)
        .await
        .unwrap();

    assert_eq!(state.user_initials(), Some("AN"));
    assert_eq!(fx.refresher.get_access().as_deref(), Some("tok"));
    assert_eq!(
        fx.storage.get(StorageArea::Session, "asoc:accessToken").unwrap().as_deref(),
        Some("tok")
    );
    let body = fx.transport.requests()[0].body.clone().unwrap();
    assert_eq!(body, r#"{"email":"ana@x.es","password":"secreto"}"#);
}

#[tokio::test]
async fn rejected_login_reports_backend_message() {
    let fx = fixture();
    fx.transport.respond(LOGIN_PATH, 200, r#"{"ok":false,"error":"Credenciales incorrectas"}"#);
    fx.transport.respond(LOGIN_PATH, 401, r#"{"message":"bloqueado"}"#);
    fx.transport.respond(LOGIN_PATH, 502, "<html>");

    let first = fx.client.login("a@b.es", "x", TokenPersistence::None).await.unwrap_err();
    let second = fx.client.login("a@b.es", "x", TokenPersistence::None).await.unwrap_err();
    let third = fx.client.login("a@b.es", "x", TokenPersistence::None).await.unwrap_err();

    assert_eq!(first, ApiError::Rejected("Credenciales incorrectas".to_owned()));
    assert_eq!(second, ApiError::Rejected("bloqueado".to_owned()));
    assert_eq!(
        third,
        ApiError::Status {
            status: 502,
            body: "<html>".to_owned()
        }
    );
    assert_eq!(fx.transport.calls_to(REFRESH_PATH), 0);
}

#[tokio::test]
async fn logout_clears_token_and_session() {
    let fx = fixture();
    fx.transport.respond(LOGIN_PATH, 200, r#"{"ok":true,"access_token":"tok","name":"Ana"}"#);
    fx.transport.respond(LOGOUT_PATH, 200, "{}");
    fx.client
        .login("ana@x.es", "secreto", TokenPersistence::SessionAndDurable)
        .await
        .unwrap();

    fx.client.logout().await;

    assert_eq!(fx.refresher.get_access(), None);
    assert_eq!(fx.storage.get(StorageArea::Durable, "asoc:accessToken").unwrap(), None);
    assert_eq!(fx.storage.get(StorageArea::Durable, "asoc:isLoggedIn").unwrap(), None);
    assert_eq!(fx.transport.calls_to(LOGOUT_PATH), 1);
}
