//! Lenient normalization of identity and profile responses.
//!
//! DESIGN
//! ======
//! The backend answers `whoami` and the profile endpoint with several shapes
//! (flat fields, a nested `user`, PHP `session_vars`, Spanish and English key
//! spellings, or a bare `"1"`). Responses are kept as an untyped [`RawRecord`]
//! and folded into a strict [`Identity`] here, field by field. Missing or
//! wrong-typed fields read as absent; nothing in this module fails.
//!
//! A session identifier alone never proves a login. Only an explicit flag or a
//! non-empty user id does.

#[cfg(test)]
#[path = "probe_test.rs"]
mod probe_test;

use serde_json::Value;

use super::events::SessionUpdate;

/// Explicit login flags. When present, they override `ok`/`success`.
const LOGGED_KEYS: [&str; 5] = [
    "logged",
    "logged_in",
    "loggedIn",
    "isLoggedIn",
    "authenticated",
];
const SUCCESS_KEYS: [&str; 2] = ["ok", "success"];
const UID_KEYS: [&str; 5] = ["uid", "user_id", "userId", "id_socio", "socio_id"];
const NAME_KEYS: [&str; 7] = [
    "name",
    "nombre",
    "userName",
    "user_name",
    "display_name",
    "displayName",
    "nombre_completo",
];
const EMAIL_KEYS: [&str; 3] = ["email", "correo", "mail"];

const WHOAMI_CONTAINERS: [&str; 2] = ["user", "session_vars"];
const PROFILE_CONTAINERS: [&str; 3] = ["socio", "data", "user"];

const FULL_NAME_KEYS: [&str; 5] = [
    "nombre_completo",
    "full_name",
    "fullName",
    "display_name",
    "name",
];
const GIVEN_NAME_KEYS: [&str; 3] = ["nombre", "first_name", "given_name"];
const FIRST_SURNAME_KEYS: [&str; 4] = ["apellido1", "primer_apellido", "last_name", "surname"];
const SECOND_SURNAME_KEYS: [&str; 2] = ["apellido2", "segundo_apellido"];

/// An unparsed backend response.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord(Value);

impl RawRecord {
    /// Parse a response body. Non-JSON text is kept as a bare string.
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        Self(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_owned())))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The top-level object followed by any nested objects under `nested`.
    fn containers<'a>(&'a self, nested: &[&str]) -> Vec<&'a Value> {
        let mut out = Vec::new();
        if self.0.is_object() {
            out.push(&self.0);
            for key in nested {
                if let Some(inner) = self.0.get(*key).filter(|v| v.is_object()) {
                    out.push(inner);
                }
            }
        }
        out
    }
}

/// Normalized login status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub logged: bool,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Logged in but missing a name or email the profile endpoint may supply.
    pub fn needs_profile(&self) -> bool {
        self.logged && (self.name.is_none() || self.email.is_none())
    }

    /// Fill in whatever is still unknown from a profile response.
    pub fn merge_profile(&mut self, profile: &RawRecord) {
        if self.name.is_none() {
            self.name = profile_name(profile);
        }
        if self.email.is_none() {
            let containers = profile.containers(&PROFILE_CONTAINERS);
            self.email = pick_str(&containers, &EMAIL_KEYS);
        }
    }

    pub fn to_update(&self) -> SessionUpdate {
        SessionUpdate {
            logged: self.logged,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Fold a `whoami` response into an [`Identity`].
pub fn normalize_whoami(raw: &RawRecord) -> Identity {
    let logged = match &raw.0 {
        Value::Object(_) => object_is_logged(raw),
        scalar => truthy(scalar),
    };
    if !logged {
        return Identity::logged_out();
    }

    let containers = raw.containers(&WHOAMI_CONTAINERS);
    let name = pick_str(&containers, &NAME_KEYS).or_else(|| {
        raw.0
            .get("user")
            .and_then(Value::as_str)
            .and_then(non_empty)
    });
    let email = pick_str(&containers, &EMAIL_KEYS);
    Identity {
        logged,
        name,
        email,
    }
}

fn object_is_logged(raw: &RawRecord) -> bool {
    let containers = raw.containers(&WHOAMI_CONTAINERS);
    if has_user_id(raw, &containers) {
        return true;
    }
    let explicit = containers
        .iter()
        .find_map(|c| LOGGED_KEYS.iter().find_map(|k| c.get(*k)))
        .map(truthy);
    match explicit {
        Some(flag) => flag,
        None => containers
            .iter()
            .any(|c| SUCCESS_KEYS.iter().any(|k| c.get(*k).is_some_and(truthy))),
    }
}

fn has_user_id(raw: &RawRecord, containers: &[&Value]) -> bool {
    let flat = containers
        .iter()
        .any(|c| UID_KEYS.iter().any(|k| c.get(*k).is_some_and(is_present_id)));
    let nested = raw
        .0
        .get("user")
        .and_then(|u| u.get("id"))
        .is_some_and(is_present_id);
    flat || nested
}

/// Non-empty string or non-zero number. `"0"` and `0` are treated as absent.
fn is_present_id(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && s != "0"
        }
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Best display name in a profile response.
///
/// Takes the first full-name field, otherwise composes given name and
/// surnames.
pub fn profile_name(raw: &RawRecord) -> Option<String> {
    let containers = raw.containers(&PROFILE_CONTAINERS);
    if let Some(full) = pick_str(&containers, &FULL_NAME_KEYS) {
        return Some(full);
    }
    let name_fields = [
        &GIVEN_NAME_KEYS[..],
        &FIRST_SURNAME_KEYS[..],
        &SECOND_SURNAME_KEYS[..],
    ];
    let parts: Vec<String> = name_fields
        .into_iter()
        .filter_map(|keys| pick_str(&containers, keys))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "si" | "sí" | "ok"
        ),
        _ => false,
    }
}

/// First non-empty string under any of `keys`, searching containers in order.
fn pick_str(containers: &[&Value], keys: &[&str]) -> Option<String> {
    containers.iter().find_map(|c| {
        keys.iter()
            .find_map(|k| c.get(*k).and_then(Value::as_str).and_then(non_empty))
    })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}
