use std::future::Future;

use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::types::{ProviderAuth, Session, SessionChange};

/// External identity provider boundary.
///
/// Implementations own the provider-side session and announce changes to it
/// (sign-in, sign-out, token refresh) to subscribers.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Email/password sign-in
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderAuth, AuthError>> + Send;

    /// Email/password registration
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderAuth, AuthError>> + Send;

    /// Exchange the current refresh token for a new session
    fn refresh_session(&self) -> impl Future<Output = Result<Session, AuthError>> + Send;

    /// End the provider-side session
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Current provider session, if any
    fn get_session(&self) -> Option<Session>;

    /// Subscribe to session-change notifications. The first notification a
    /// new subscriber sees may be `InitialSession` with the current session.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}
