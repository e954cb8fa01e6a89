//! Application context.
//!
//! `AppServices` owns the tokio runtime, the identity gateway and the weather
//! gateway. It is created once by the binary and handed to the models that
//! need it; there is no global instance.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use skyview_auth::{IdentityGateway, SessionStore, SupabaseAuth, User};
use skyview_core::Config;
use skyview_weather::WeatherProvider;

use crate::models::auth_model::AuthModel;
use crate::models::dashboard_model::DashboardModel;

pub type Gateway = IdentityGateway<SupabaseAuth>;

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    config: Config,

    identity: Arc<Gateway>,

    weather: Arc<WeatherProvider>,

    /// Cancelled on shutdown; stops the session observer
    shutdown: CancellationToken,

    observer: Mutex<Option<JoinHandle<()>>>,
}

impl AppServices {
    /// Build the runtime and gateways from `config`. No I/O happens until
    /// [`init`](Self::init).
    ///
    /// # Errors
    /// Fails if the runtime or an HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("skyview-worker")
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        if !config.identity.is_configured() {
            tracing::warn!("Identity provider not configured; sign in will fail");
        }
        let provider = SupabaseAuth::new(&config.identity.url, &config.identity.anon_key)
            .context("Failed to create identity client")?;
        let store = SessionStore::new(&config.profile_dir());
        let identity = Arc::new(IdentityGateway::new(Arc::new(provider), Arc::new(store)));

        let weather = WeatherProvider::with_base_url(
            config.weather.api_key().map(String::from),
            &config.weather.base_url,
        )
        .context("Failed to create weather client")?;

        Ok(Self {
            runtime,
            config,
            identity,
            weather: Arc::new(weather),
            shutdown: CancellationToken::new(),
            observer: Mutex::new(None),
        })
    }

    /// Restore the persisted profile and start observing provider sessions.
    ///
    /// Returns the restored user, if any. Calling twice restarts nothing.
    pub fn init(&self) -> Option<User> {
        let user = self.identity.restore();

        let mut observer = self.observer.lock();
        if observer.is_none() {
            *observer = Some(
                self.identity
                    .spawn_session_observer(self.runtime.handle(), self.shutdown.clone()),
            );
        }

        tracing::info!(
            "Services initialized ({})",
            if user.is_some() { "signed in" } else { "signed out" }
        );
        user
    }

    /// Cancel background tasks and wait for the session observer to exit.
    pub fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");
        self.shutdown.cancel();

        if let Some(handle) = self.observer.lock().take() {
            if let Err(e) = self.runtime.block_on(handle) {
                tracing::warn!("Session observer ended abnormally: {}", e);
            }
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &Arc<Gateway> {
        &self.identity
    }

    pub fn weather(&self) -> &Arc<WeatherProvider> {
        &self.weather
    }

    pub fn auth_model(&self) -> AuthModel {
        AuthModel::new(Arc::clone(&self.identity), self.runtime())
    }

    pub fn dashboard_model(&self) -> DashboardModel {
        DashboardModel::new(
            Arc::clone(&self.identity),
            Arc::clone(&self.weather),
            self.runtime(),
            &self.config.weather,
        )
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("identity", &self.identity.store())
            .field("has_weather_key", &self.weather.has_api_key())
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}
