//! Header badge with the member's initials and a logout action.

#[cfg(test)]
#[path = "user_badge_test.rs"]
mod user_badge_test;

use leptos::prelude::*;

use crate::session::state::SessionState;

/// Badge text; empty when logged out.
pub fn badge_text(state: &SessionState) -> String {
    state.badge_label().unwrap_or_default()
}

/// Tooltip: the full name when known.
pub fn badge_title(state: &SessionState) -> String {
    state.user_name().unwrap_or("Socio").to_owned()
}

#[component]
pub fn UserBadge() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let busy = RwSignal::new(false);

    let on_logout = move |_| {
        if busy.get() {
            return;
        }
        busy.set(true);
        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            crate::runtime::shared().logout().await;
            busy.set(false);
        });
    };

    view! {
        <Show
            when=move || session.with(SessionState::is_logged_in)
            fallback=|| view! { <a class="user-badge__login" href="/login">"Iniciar sesión"</a> }
        >
            <span class="user-badge" title=move || session.with(badge_title)>
                {move || session.with(badge_text)}
            </span>
            <button class="user-badge__logout" on:click=on_logout disabled=move || busy.get()>
                "Salir"
            </button>
        </Show>
    }
}
