use serde::{Deserialize, Serialize};

/// Signed-in user profile. This is the only locally persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier assigned by the identity provider
    pub id: String,
    pub email: String,
    /// Display name
    pub name: String,
}

impl User {
    /// Local part of an email address (everything before `@`)
    pub fn name_from_email(email: &str) -> String {
        email.split('@').next().unwrap_or_default().to_string()
    }

    /// Name used in the dashboard greeting: display name, else the email
    /// local part, else "User".
    pub fn greeting_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        let local = Self::name_from_email(&self.email);
        if local.is_empty() {
            "User".to_string()
        } else {
            local
        }
    }
}

/// Identity provider session. Mirrored locally, never persisted by us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// User record as returned by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign-in or sign-up.
///
/// `session` is absent when sign-up still awaits email confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAuth {
    pub user: ProviderUser,
    pub session: Option<Session>,
}

/// Session-change notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Notification delivered to session observers
pub type SessionChange = (AuthEvent, Option<Session>);
