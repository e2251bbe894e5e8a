//! Observable login state and display initials.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

/// Glyph shown in place of initials when a logged-in user has no usable name.
pub const PLACEHOLDER_INITIALS: &str = "?";

/// Login state as seen by the UI.
///
/// Initials are derived, never stored: they are present only when the user is
/// logged in and the name yields at least one usable character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    logged_in: bool,
    user_name: Option<String>,
    user_initials: Option<String>,
}

impl SessionState {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn logged_in(name: Option<&str>) -> Self {
        let user_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        let user_initials = user_name.as_deref().and_then(derive_initials);
        Self {
            logged_in: true,
            user_name,
            user_initials,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn user_initials(&self) -> Option<&str> {
        self.user_initials.as_deref()
    }

    /// Text for the header badge: initials, the placeholder, or nothing when logged out.
    pub fn badge_label(&self) -> Option<String> {
        if !self.logged_in {
            return None;
        }
        Some(self.user_initials.clone().unwrap_or_else(|| PLACEHOLDER_INITIALS.to_owned()))
    }
}

/// Up to two uppercase characters taken from the start of `name`.
///
/// Keeps letters, digits, whitespace and hyphens (Unicode aware) and
/// collapses whitespace runs. When the first two kept characters hold no
/// letter or digit (a leading hyphen, say), the first two alphanumerics of the
/// name are used instead.
pub fn derive_initials(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let primary = collapsed.chars().take(2).collect::<String>();
    if primary.chars().any(char::is_alphanumeric) {
        return Some(primary.trim().to_uppercase());
    }

    let fallback: String = name.chars().filter(|c| c.is_alphanumeric()).take(2).collect();
    (!fallback.is_empty()).then(|| fallback.to_uppercase())
}
