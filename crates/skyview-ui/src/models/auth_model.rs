//! Sign-in / sign-up screen state and view routing.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use skyview_auth::{IdentityGateway, IdentityProvider, SupabaseAuth, User};
use skyview_core::{AppError, ValidationError};
use tokio::runtime::Handle;

use crate::forms::{LoginForm, SignupForm};
use crate::notification::Notification;
use crate::services::{request_login, request_logout, request_signup, AuthServiceMessage};

/// Which form the unauthenticated screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

/// Top-level screen to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthView {
    Loading,
    SignIn,
    SignUp,
    Dashboard,
}

pub struct AuthModel<P: IdentityProvider = SupabaseAuth> {
    gateway: Arc<IdentityGateway<P>>,
    runtime: Handle,
    tx: Sender<AuthServiceMessage>,
    rx: Receiver<AuthServiceMessage>,
    mode: AuthMode,
    /// Submitted calls whose result has not been polled yet
    pending: usize,
    notifications: Vec<Notification>,
}

impl<P: IdentityProvider> AuthModel<P> {
    pub fn new(gateway: Arc<IdentityGateway<P>>, runtime: Handle) -> Self {
        let (tx, rx) = channel();
        Self {
            gateway,
            runtime,
            tx,
            rx,
            mode: AuthMode::default(),
            pending: 0,
            notifications: Vec::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<IdentityGateway<P>> {
        &self.gateway
    }

    /// Screen for the current session state.
    ///
    /// `Loading` while the stored profile is being restored or an auth call
    /// is pending without a signed-in user.
    pub fn view(&self) -> AuthView {
        if self.gateway.store().is_restoring() {
            return AuthView::Loading;
        }
        if self.gateway.current_user().is_some() {
            return AuthView::Dashboard;
        }
        if self.is_submitting() {
            return AuthView::Loading;
        }
        match self.mode {
            AuthMode::SignIn => AuthView::SignIn,
            AuthMode::SignUp => AuthView::SignUp,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
    }

    pub fn user(&self) -> Option<User> {
        self.gateway.current_user()
    }

    /// Whether the submit buttons should be disabled.
    ///
    /// Advisory: submitting again while true still issues a second call.
    pub fn is_submitting(&self) -> bool {
        self.pending > 0 || self.gateway.in_progress()
    }

    /// Validate and submit the login form.
    ///
    /// # Errors
    /// Returns the validation failure (also queued as a notification);
    /// the gateway is not called in that case.
    pub fn submit_login(&mut self, form: &LoginForm) -> Result<(), ValidationError> {
        self.check(form.validate())?;

        self.pending += 1;
        request_login(
            &self.tx,
            &self.runtime,
            Arc::clone(&self.gateway),
            form.email.trim().to_string(),
            form.password.clone(),
        );
        Ok(())
    }

    /// Validate and submit the signup form.
    ///
    /// # Errors
    /// Returns the validation failure (also queued as a notification);
    /// the gateway is not called in that case.
    pub fn submit_signup(&mut self, form: &SignupForm) -> Result<(), ValidationError> {
        self.check(form.validate())?;

        self.pending += 1;
        request_signup(
            &self.tx,
            &self.runtime,
            Arc::clone(&self.gateway),
            form.name.trim().to_string(),
            form.email.trim().to_string(),
            form.password.clone(),
        );
        Ok(())
    }

    pub fn logout(&mut self) {
        request_logout(&self.tx, &self.runtime, Arc::clone(&self.gateway));
    }

    fn check(&mut self, result: Result<(), ValidationError>) -> Result<(), ValidationError> {
        if let Err(e) = &result {
            tracing::debug!("Form rejected: {}", e);
            self.notifications
                .push(Notification::from(&AppError::from(e.clone())));
        }
        result
    }

    /// Apply finished auth calls. Returns true if anything changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;

        while let Ok(msg) = self.rx.try_recv() {
            changed = true;
            match msg {
                AuthServiceMessage::LoginDone(result) => {
                    self.pending = self.pending.saturating_sub(1);
                    self.finish(
                        result,
                        Notification::success("Welcome back!", "You've been successfully logged in."),
                    );
                }
                AuthServiceMessage::SignupDone(result) => {
                    self.pending = self.pending.saturating_sub(1);
                    self.finish(
                        result,
                        Notification::success("Welcome!", "Your account has been created successfully."),
                    );
                }
                AuthServiceMessage::LogoutDone => {
                    self.mode = AuthMode::SignIn;
                }
            }
        }

        changed
    }

    fn finish(&mut self, result: Result<User, skyview_auth::AuthError>, welcome: Notification) {
        match result {
            Ok(_) => self.notifications.push(welcome),
            Err(e) => {
                let err = AppError::from(e);
                self.notifications.push(Notification::from(&err));
            }
        }
    }

    /// Drain queued notifications
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
