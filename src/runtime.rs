//! Session runtime: one object wiring transport, storage, bus and refresher.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages and components never build the session machinery themselves. In the
//! WASM build they reach the per-page instance through [`shared`] and kick it
//! off with [`start`] once hydration has finished; native builds and tests
//! construct a [`SessionRuntime`] over their own transport and storage.
//!
//! DESIGN
//! ======
//! Startup order matters. Listeners go in first so no cross-tab change is
//! missed, then persisted state is loaded synchronously so the header shows
//! the last known user immediately, and only then does the backend probe run.

#[cfg(test)]
#[path = "runtime_test.rs"]
mod runtime_test;

use std::cell::Cell;
use std::rc::Rc;

use futures::StreamExt;
use futures::future::{FutureExt, LocalBoxFuture};

use crate::auth::refresh::RefreshCoordinator;
use crate::auth::timer::Timer;
use crate::auth::token::AccessToken;
use crate::config::ClientConfig;
use crate::net::http::{ApiError, HttpTransport};
use crate::net::interceptor::AuthClient;
use crate::session::bootstrap::bootstrap_session;
use crate::session::events::SessionBus;
use crate::session::probe::Identity;
use crate::session::state::SessionState;
use crate::session::storage::{KeyValueStorage, TokenPersistence};
use crate::session::store::LocalSessionStore;

pub struct SessionRuntime<T, C> {
    config: ClientConfig,
    transport: Rc<T>,
    token: AccessToken,
    bus: SessionBus,
    store: Rc<LocalSessionStore>,
    refresher: Rc<RefreshCoordinator<T, C>>,
    client: AuthClient<T, C>,
    started: Cell<bool>,
}

impl<T: HttpTransport, C: Timer> SessionRuntime<T, C> {
    pub fn new(
        config: ClientConfig,
        transport: Rc<T>,
        timer: C,
        storage: Rc<dyn KeyValueStorage>,
    ) -> Self {
        let bus = SessionBus::new();
        let store = Rc::new(LocalSessionStore::new(&config, storage, bus.clone()));
        let token = AccessToken::new();
        let refresher = Rc::new(RefreshCoordinator::new(
            Rc::clone(&transport),
            timer,
            token.clone(),
            config.refresh_timeout,
        ));
        let client = AuthClient::new(
            Rc::clone(&transport),
            Rc::clone(&refresher),
            Rc::clone(&store),
        );
        Self {
            config,
            transport,
            token,
            bus,
            store,
            refresher,
            client,
            started: Cell::new(false),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn bus(&self) -> &SessionBus {
        &self.bus
    }

    pub fn store(&self) -> &LocalSessionStore {
        &self.store
    }

    pub fn refresher(&self) -> &RefreshCoordinator<T, C> {
        &self.refresher
    }

    /// Authenticated client for feature code.
    pub fn client(&self) -> &AuthClient<T, C> {
        &self.client
    }

    /// Returns `true` exactly once, for the first caller.
    pub fn mark_started(&self) -> bool {
        !self.started.replace(true)
    }

    /// Load persisted session state and any kept bearer token into memory.
    pub fn restore(&self) {
        self.store.refresh_from_storage();
        if self.refresher.get_access().is_none() {
            self.refresher.set_access(self.store.persisted_token());
        }
    }

    /// Ask the backend who the visitor is. Never fails; see `session::bootstrap`.
    pub async fn bootstrap(&self) -> Identity {
        let identity = bootstrap_session(self.transport.as_ref(), &self.store).await;
        if !identity.logged {
            self.refresher.set_access(None);
        }
        identity
    }

    /// # Errors
    ///
    /// See [`AuthClient::login`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        persistence: TokenPersistence,
    ) -> Result<SessionState, ApiError> {
        self.client.login(email, password, persistence).await
    }

    pub async fn logout(&self) {
        self.client.logout().await;
    }

    /// Feed every bus signal into the store until the bus goes away.
    ///
    /// A logout seen this way (another tab) also drops the bearer token. The
    /// subscription is taken when this is called, not when the future is
    /// first polled.
    pub fn pump_signals(&self) -> LocalBoxFuture<'static, ()> {
        let mut signals = self.bus.subscribe();
        let store = Rc::clone(&self.store);
        let token = self.token.clone();
        async move {
            while let Some(signal) = signals.next().await {
                let was_logged_in = store.state().is_logged_in();
                store.handle_signal(&signal);
                if was_logged_in && !store.state().is_logged_in() {
                    token.clear();
                }
            }
        }
        .boxed_local()
    }

    /// Forget the in-memory session and token. Persisted keys stay untouched.
    pub fn reset(&self) {
        self.refresher.reset();
        self.store.reset();
    }
}

#[cfg(feature = "hydrate")]
pub use browser_runtime::{BrowserRuntime, shared, start};

#[cfg(feature = "hydrate")]
mod browser_runtime {
    use std::rc::Rc;

    use super::SessionRuntime;
    use crate::auth::timer::GlooTimer;
    use crate::config::ClientConfig;
    use crate::net::http::GlooTransport;
    use crate::session::browser::{dispatch_dom_event, install_listeners};
    use crate::session::storage::BrowserStorage;

    pub type BrowserRuntime = SessionRuntime<GlooTransport, GlooTimer>;

    impl BrowserRuntime {
        pub fn browser(config: ClientConfig) -> Self {
            let transport = Rc::new(GlooTransport::new(config.api_base.clone()));
            Self::new(config, transport, GlooTimer, Rc::new(BrowserStorage))
        }
    }

    thread_local! {
        static SHARED: Rc<BrowserRuntime> =
            Rc::new(BrowserRuntime::browser(ClientConfig::from_window()));
    }

    /// The page's runtime, created on first use.
    pub fn shared() -> Rc<BrowserRuntime> {
        SHARED.with(Rc::clone)
    }

    /// Install DOM listeners, restore persisted state and probe the backend.
    /// Later calls are no-ops.
    pub fn start() {
        let rt = shared();
        if !rt.mark_started() {
            return;
        }
        install_listeners(rt.bus());
        let event_name = rt.config().broadcast_event.clone();
        rt.bus().set_mirror(move |update| dispatch_dom_event(&event_name, update));
        rt.restore();
        leptos::task::spawn_local(rt.pump_signals());
        leptos::task::spawn_local(async move {
            let identity = rt.bootstrap().await;
            leptos::logging::log!("session bootstrap: logged={}", identity.logged);
        });
    }
}
