use super::*;

#[test]
fn validate_login_input_trims_email_and_keeps_password() {
    assert_eq!(
        validate_login_input("  ana@x.es ", " clave "),
        Ok(("ana@x.es".to_owned(), " clave ".to_owned()))
    );
}

#[test]
fn validate_login_input_requires_an_email_address() {
    assert_eq!(validate_login_input("   ", "clave"), Err(MSG_BAD_EMAIL));
    assert_eq!(validate_login_input("ana.x.es", "clave"), Err(MSG_BAD_EMAIL));
}

#[test]
fn validate_login_input_requires_password() {
    assert_eq!(validate_login_input("ana@x.es", ""), Err(MSG_NO_PASSWORD));
}

#[test]
fn remember_me_overrides_configured_persistence() {
    assert_eq!(persistence_for(true, TokenPersistence::None), TokenPersistence::SessionAndDurable);
    assert_eq!(
        persistence_for(false, TokenPersistence::SessionOnly),
        TokenPersistence::SessionOnly
    );
}

#[test]
fn login_error_message_prefers_backend_text() {
    assert_eq!(
        login_error_message(&ApiError::Rejected("Credenciales incorrectas".to_owned())),
        "Credenciales incorrectas"
    );
    assert_eq!(login_error_message(&ApiError::Timeout), "No se pudo conectar con el servidor.");
    let unavailable = ApiError::Status {
        status: 503,
        body: String::new(),
    };
    assert_eq!(login_error_message(&unavailable), "Error del servidor (503).");
}
