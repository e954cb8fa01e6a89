//! Identity gateway: login/signup/logout intents against an
//! [`IdentityProvider`], normalized into [`User`] and recorded in the
//! [`SessionStore`].
//!
//! Field presence and password confirmation are checked by the caller's
//! forms, not here.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AuthError;
use crate::provider::IdentityProvider;
use crate::storage::SessionStore;
use crate::types::{ProviderAuth, User};

/// Counts an auth call as in flight for as long as it lives
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct IdentityGateway<P: IdentityProvider> {
    provider: Arc<P>,
    store: Arc<SessionStore>,
    in_progress: AtomicUsize,
}

impl<P: IdentityProvider> IdentityGateway<P> {
    pub fn new(provider: Arc<P>, store: Arc<SessionStore>) -> Self {
        Self {
            provider,
            store,
            in_progress: AtomicUsize::new(0),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Restore the persisted profile (startup)
    pub fn restore(&self) -> Option<User> {
        self.store.restore()
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.current_user()
    }

    /// True while any login or signup call is pending.
    ///
    /// Advisory only: concurrent calls are not rejected.
    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst) > 0
    }

    /// True while restoring or while an auth call is pending
    pub fn is_loading(&self) -> bool {
        self.store.is_restoring() || self.in_progress()
    }

    /// Sign in with email and password.
    ///
    /// The email is lower-cased before submission and the display name is the
    /// email's local part.
    ///
    /// # Errors
    /// Returns the provider's rejection or transport failure unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let _in_flight = InFlight::start(&self.in_progress);
        let email = email.to_lowercase();

        let auth = match self.provider.sign_in_with_password(&email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::error!("Sign-in error: {}", e);
                return Err(e);
            }
        };

        let name = User::name_from_email(&email);
        let user = self.accept(auth, &email, name);
        tracing::info!("Signed in as {}", user.email);
        Ok(user)
    }

    /// Register a new account; the caller-supplied name becomes the display name.
    ///
    /// # Errors
    /// Returns the provider's rejection (duplicate account, weak password) or
    /// transport failure unchanged.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let _in_flight = InFlight::start(&self.in_progress);
        let email = email.to_lowercase();

        let auth = match self.provider.sign_up(&email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::error!("Error signing up: {}", e);
                return Err(e);
            }
        };

        let user = self.accept(auth, &email, name.to_string());
        tracing::info!("Registered {}", user.email);
        Ok(user)
    }

    /// Sign out. A failed provider call is logged and local state is cleared
    /// regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!("Error signing out: {}", e);
        }

        self.store.set_session(None);
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear persisted profile: {}", e);
        }
        tracing::info!("Signed out");
    }

    /// Exchange the refresh token for a new session and mirror it.
    ///
    /// # Errors
    /// `MissingSession` when nobody is signed in; otherwise the provider's
    /// rejection or transport failure.
    pub async fn refresh_session(&self) -> Result<(), AuthError> {
        let session = self.provider.refresh_session().await?;
        self.store.set_session(Some(session));
        tracing::debug!("Session refreshed");
        Ok(())
    }

    /// Build the user, mirror the session and persist the profile.
    fn accept(&self, auth: ProviderAuth, submitted_email: &str, name: String) -> User {
        let user = User {
            id: auth.user.id,
            email: auth
                .user
                .email
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| submitted_email.to_string()),
            name,
        };

        if auth.session.is_some() {
            self.store.set_session(auth.session);
        }

        // Persistence failures do not fail the sign-in
        if let Err(e) = self.store.persist(&user) {
            tracing::warn!("Failed to persist profile: {}", e);
        }

        user
    }

    /// Mirror provider session changes into the store until `cancel` fires.
    pub fn spawn_session_observer(
        &self,
        runtime: &tokio::runtime::Handle,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        // Subscribe before reading the current session so no change is missed
        let mut rx = self.provider.subscribe();
        let store = self.store.clone();
        store.set_session(self.provider.get_session());

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Session observer stopped");
                        break;
                    }
                    msg = rx.recv() => match msg {
                        Ok((event, session)) => {
                            tracing::debug!("Session change: {:?}", event);
                            store.set_session(session);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Session observer lagged, skipped {} events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::types::{AuthEvent, ProviderUser, Session, SessionChange};
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::broadcast;

    /// Scriptable in-memory provider
    struct FakeProvider {
        reject_with: Option<String>,
        fail_sign_out: bool,
        omit_email: bool,
        /// Sign-ins for this address take a while to answer
        slow_email: Option<String>,
        sign_out_calls: AtomicUsize,
        submitted: Mutex<Vec<String>>,
        session: Mutex<Option<Session>>,
        events: broadcast::Sender<SessionChange>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                reject_with: None,
                fail_sign_out: false,
                omit_email: false,
                slow_email: None,
                sign_out_calls: AtomicUsize::new(0),
                submitted: Mutex::new(Vec::new()),
                session: Mutex::new(None),
                events: broadcast::channel(8).0,
            }
        }

        fn session() -> Session {
            Session {
                access_token: "token".into(),
                refresh_token: Some("refresh".into()),
                token_type: "bearer".into(),
                expires_in: Some(3600),
                expires_at: None,
            }
        }

        fn respond(&self, email: &str) -> Result<ProviderAuth, AuthError> {
            self.submitted.lock().push(email.to_string());
            if let Some(msg) = &self.reject_with {
                return Err(AuthError::Provider(msg.clone()));
            }
            *self.session.lock() = Some(Self::session());
            Ok(ProviderAuth {
                user: ProviderUser {
                    id: "user-123".into(),
                    email: (!self.omit_email).then(|| email.to_string()),
                },
                session: Some(Self::session()),
            })
        }
    }

    impl IdentityProvider for FakeProvider {
        async fn sign_in_with_password(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<ProviderAuth, AuthError> {
            if self.slow_email.as_deref() == Some(email) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            self.respond(email)
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<ProviderAuth, AuthError> {
            self.respond(email)
        }

        async fn refresh_session(&self) -> Result<Session, AuthError> {
            let mut current = self.session.lock();
            if current.is_none() {
                return Err(AuthError::MissingSession);
            }
            let refreshed = Session {
                access_token: "token-2".into(),
                ..Self::session()
            };
            *current = Some(refreshed.clone());
            Ok(refreshed)
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_sign_out {
                return Err(AuthError::Provider("Failed to fetch".into()));
            }
            *self.session.lock() = None;
            Ok(())
        }

        fn get_session(&self) -> Option<Session> {
            self.session.lock().clone()
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
            self.events.subscribe()
        }
    }

    fn gateway(provider: FakeProvider, dir: &std::path::Path) -> IdentityGateway<FakeProvider> {
        let store = Arc::new(SessionStore::new(dir));
        store.restore();
        IdentityGateway::new(Arc::new(provider), store)
    }

    #[tokio::test]
    async fn test_login_lowercases_email_and_derives_name() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway(FakeProvider::new(), dir.path());

        let user = gw.login("USER@Example.com", "secret").await.unwrap();

        assert_eq!(user.email, "user@example.com");
        assert_eq!(user.name, "user");
        assert_eq!(user.id, "user-123");
        assert_eq!(gw.provider().submitted.lock().as_slice(), ["user@example.com"]);
        assert_eq!(gw.current_user(), Some(user.clone()));
        assert!(gw.store().has_session());
        assert!(!gw.in_progress());

        // Persisted for the next start
        let fresh = SessionStore::new(dir.path());
        assert_eq!(fresh.restore(), Some(user));
    }

    #[tokio::test]
    async fn test_login_falls_back_to_submitted_email() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FakeProvider::new();
        provider.omit_email = true;
        let gw = gateway(provider, dir.path());

        let user = gw.login("Someone@Mail.org", "pw").await.unwrap();
        assert_eq!(user.email, "someone@mail.org");
    }

    #[tokio::test]
    async fn test_login_rejection_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FakeProvider::new();
        provider.reject_with = Some("Invalid login credentials".into());
        let gw = gateway(provider, dir.path());

        let err = gw.login("a@b.com", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(gw.current_user().is_none());
        assert!(!gw.in_progress());
        assert!(!gw.store().path().exists());
    }

    #[tokio::test]
    async fn test_signup_uses_supplied_name() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway(FakeProvider::new(), dir.path());

        let user = gw.signup("Jane Doe", "Jane@X.com", "abcdef").await.unwrap();

        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.email, "jane@x.com");
        assert_eq!(gw.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_signup_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FakeProvider::new();
        provider.reject_with = Some("User already registered".into());
        let gw = gateway(provider, dir.path());

        let err = gw.signup("Jane", "jane@x.com", "abcdef").await.unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
        assert!(gw.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_provider_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FakeProvider::new();
        provider.fail_sign_out = true;
        let gw = gateway(provider, dir.path());

        gw.login("user@example.com", "secret").await.unwrap();
        assert!(gw.store().path().exists());

        gw.logout().await;

        assert_eq!(gw.provider().sign_out_calls.load(Ordering::SeqCst), 1);
        assert!(gw.current_user().is_none());
        assert!(!gw.store().has_session());
        assert!(!gw.store().path().exists());
    }

    #[tokio::test]
    async fn test_login_succeeds_when_profile_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the profile directory should be makes persisting fail
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "x").unwrap();
        let gw = gateway(FakeProvider::new(), &blocker);

        let user = gw.login("user@example.com", "secret").await.unwrap();
        assert_eq!(gw.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_in_progress_covers_overlapping_logins() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FakeProvider::new();
        provider.slow_email = Some("slow@example.com".into());
        let gw = gateway(provider, dir.path());

        let (slow, fast_then_check) = tokio::join!(
            gw.login("slow@example.com", "secret"),
            async {
                let fast = gw.login("fast@example.com", "secret").await;
                // The slow call has not answered yet
                (fast, gw.in_progress())
            }
        );

        let (fast, pending_after_fast) = fast_then_check;
        assert!(fast.is_ok());
        assert!(pending_after_fast);
        assert!(slow.is_ok());
        assert!(!gw.in_progress());
    }

    #[tokio::test]
    async fn test_refresh_session_mirrors_new_token() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway(FakeProvider::new(), dir.path());

        let err = gw.refresh_session().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingSession));

        gw.login("user@example.com", "secret").await.unwrap();
        gw.refresh_session().await.unwrap();

        assert_eq!(gw.store().session().unwrap().access_token, "token-2");
    }

    #[tokio::test]
    async fn test_is_loading_until_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(dir.path()));
        let gw = IdentityGateway::new(Arc::new(FakeProvider::new()), store);

        assert!(gw.is_loading());
        gw.restore();
        assert!(!gw.is_loading());
    }

    #[tokio::test]
    async fn test_session_observer_mirrors_events() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway(FakeProvider::new(), dir.path());
        let cancel = CancellationToken::new();
        let handle = gw.spawn_session_observer(&tokio::runtime::Handle::current(), cancel.clone());

        gw.provider()
            .events
            .send((AuthEvent::TokenRefreshed, Some(FakeProvider::session())))
            .unwrap();
        for _ in 0..50 {
            if gw.store().has_session() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(gw.store().has_session());

        gw.provider().events.send((AuthEvent::SignedOut, None)).unwrap();
        for _ in 0..50 {
            if !gw.store().has_session() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!gw.store().has_session());

        cancel.cancel();
        handle.await.unwrap();
    }
}
