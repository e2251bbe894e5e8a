//! Login page: email + password against the membership backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The form is the only place a session is *established*. Everything after a
//! successful login (token holding, persistence, cross-tab broadcast) happens
//! in the session runtime; the page only validates input and navigates home.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;

use crate::net::http::ApiError;
use crate::session::storage::TokenPersistence;

const MSG_BAD_EMAIL: &str = "Introduce un correo electrónico válido.";
const MSG_NO_PASSWORD: &str = "Introduce tu contraseña.";

/// Trim the email and require an `@` in it, and require a non-empty password.
pub fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(MSG_BAD_EMAIL);
    }
    if password.is_empty() {
        return Err(MSG_NO_PASSWORD);
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// "Remember me" keeps the token across browser restarts.
pub fn persistence_for(remember: bool, default: TokenPersistence) -> TokenPersistence {
    if remember {
        TokenPersistence::SessionAndDurable
    } else {
        default
    }
}

/// User-facing text for a failed login.
pub fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Rejected(message) => message.clone(),
        ApiError::Network(_) | ApiError::Timeout => {
            "No se pudo conectar con el servidor.".to_owned()
        }
        ApiError::Status { status, .. } => format!("Error del servidor ({status})."),
        ApiError::Decode(_) => "Respuesta inesperada del servidor.".to_owned(),
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let remember = RwSignal::new(false);
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    #[cfg(feature = "hydrate")]
    let navigate = leptos_router::hooks::use_navigate();

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let checked = validate_login_input(&email.get(), &password.get());
        let (email_value, password_value) = match checked {
            Ok(input) => input,
            Err(message) => {
                info.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Entrando...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            let remember_value = remember.get();
            leptos::task::spawn_local(async move {
                let rt = crate::runtime::shared();
                let persistence = persistence_for(remember_value, rt.config().token_persistence);
                match rt.login(&email_value, &password_value, persistence).await {
                    Ok(_) => {
                        password.set(String::new());
                        info.set(String::new());
                        navigate("/", leptos_router::NavigateOptions::default());
                    }
                    Err(e) => {
                        leptos::logging::warn!("login failed: {e}");
                        info.set(login_error_message(&e));
                    }
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (email_value, password_value);
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Área de socios"</h1>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="email"
                        placeholder="tu@correo.es"
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Contraseña"
                        autocomplete="current-password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <label class="login-remember">
                        <input
                            type="checkbox"
                            prop:checked=move || remember.get()
                            on:change=move |ev| remember.set(event_target_checked(&ev))
                        />
                        "Recordarme"
                    </label>
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Entrar"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
            </div>
        </div>
    }
}
