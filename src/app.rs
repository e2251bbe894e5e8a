//! Root application component with routing and context providers.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::user_badge::UserBadge;
use crate::pages::login::LoginPage;
use crate::session::state::SessionState;

/// HTML shell rendered by the hosting server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="es">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the session signal as context. In the browser the runtime is
/// started from an effect, i.e. after hydration, so server and client render
/// the same logged-out markup first.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    provide_context(session_signal());

    #[cfg(feature = "hydrate")]
    Effect::new(move || crate::runtime::start());

    view! {
        <Stylesheet id="leptos" href="/pkg/socios-web.css"/>
        <Title text="Socios"/>

        <Router>
            <header class="site-header">
                <a class="site-header__home" href="/">"Socios"</a>
                <UserBadge/>
            </header>
            <main>
                <Routes fallback=|| "Página no encontrada.".into_view()>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route path=StaticSegment("") view=HomeIntro/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn HomeIntro() -> impl IntoView {
    view! { <p class="home-intro">"Bienvenido al área de socios."</p> }
}

#[cfg(feature = "hydrate")]
fn session_signal() -> RwSignal<SessionState> {
    RwSignal::from(crate::runtime::shared().store().signal())
}

#[cfg(not(feature = "hydrate"))]
fn session_signal() -> RwSignal<SessionState> {
    RwSignal::new(SessionState::default())
}
