//! Supabase Auth (GoTrue) client implementing [`IdentityProvider`].

use parking_lot::RwLock;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::error::AuthError;
use crate::provider::IdentityProvider;
use crate::types::{AuthEvent, ProviderAuth, ProviderUser, Session, SessionChange};

const EVENT_CAPACITY: usize = 16;

/// Token endpoint response: a session plus its user
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(flatten)]
    session: Session,
    user: ProviderUser,
}

/// Supabase Auth client.
pub struct SupabaseAuth {
    url: String,
    anon_key: String,
    client: Client,
    current_session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionChange>,
}

impl SupabaseAuth {
    /// Create a client for the project at `url` (e.g. `https://xyz.supabase.co`)
    pub fn new(url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let client = Client::builder().build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
            current_session: RwLock::new(None),
            events,
        })
    }

    fn set_session(&self, event: AuthEvent, session: Option<Session>) {
        *self.current_session.write() = session.clone();
        // No receivers is fine
        let _ = self.events.send((event, session));
    }

    async fn post_json(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        let url = format!("{}{}", self.url, endpoint);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(payload)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn remote_logout(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: Response) -> Result<Response, AuthError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::Provider(error_message(status, &body)))
    }
}

/// Reduce a provider error body to its human-readable message.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["msg", "error_description", "message", "error"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Authentication request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}

/// Accept either a token response or a bare user (confirmation pending).
fn parse_auth_response(value: serde_json::Value) -> Result<ProviderAuth, AuthError> {
    if value.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(value)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        return Ok(ProviderAuth {
            user: token.user,
            session: Some(token.session),
        });
    }

    let user: ProviderUser = serde_json::from_value(value)
        .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
    Ok(ProviderAuth { user, session: None })
}

impl IdentityProvider for SupabaseAuth {
    #[instrument(skip(self, password), level = "info")]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderAuth, AuthError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let value = self
            .post_json("/auth/v1/token?grant_type=password", &payload)
            .await?;

        let auth = parse_auth_response(value)?;
        if auth.session.is_some() {
            self.set_session(AuthEvent::SignedIn, auth.session.clone());
        }
        Ok(auth)
    }

    #[instrument(skip(self, password), level = "info")]
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAuth, AuthError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let value = self.post_json("/auth/v1/signup", &payload).await?;

        let auth = parse_auth_response(value)?;
        if auth.session.is_some() {
            self.set_session(AuthEvent::SignedIn, auth.session.clone());
        } else {
            tracing::info!("Sign-up accepted; awaiting email confirmation");
        }
        Ok(auth)
    }

    #[instrument(skip(self), level = "info")]
    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let refresh_token = self
            .current_session
            .read()
            .as_ref()
            .and_then(|s| s.refresh_token.clone());

        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::MissingSession);
        };

        let payload = serde_json::json!({ "refresh_token": refresh_token });
        let value = self
            .post_json("/auth/v1/token?grant_type=refresh_token", &payload)
            .await?;

        let session = parse_auth_response(value)?
            .session
            .ok_or_else(|| AuthError::InvalidResponse("Refresh returned no session".into()))?;
        self.set_session(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    #[instrument(skip(self), level = "info")]
    async fn sign_out(&self) -> Result<(), AuthError> {
        let access_token = self
            .current_session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone());

        let Some(access_token) = access_token else {
            self.set_session(AuthEvent::SignedOut, None);
            return Ok(());
        };

        let result = self.remote_logout(&access_token).await;

        // The local session ends whatever the remote outcome
        self.set_session(AuthEvent::SignedOut, None);
        result
    }

    fn get_session(&self) -> Option<Session> {
        self.current_session.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        let rx = self.events.subscribe();
        // Existing subscribers see the current session restated
        let _ = self
            .events
            .send((AuthEvent::InitialSession, self.get_session()));
        rx
    }
}

impl std::fmt::Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuth")
            .field("url", &self.url)
            .field("has_session", &self.current_session.read().is_some())
            .finish()
    }
}
