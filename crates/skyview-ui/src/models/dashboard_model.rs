//! Dashboard controller: current city, unit system and the weather panel.
//!
//! Every fetch is tagged with a sequence number; only the result of the most
//! recently issued fetch is applied, so a slow response for an earlier city or
//! unit system can never overwrite a newer one.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use skyview_auth::{IdentityGateway, IdentityProvider, SupabaseAuth};
use skyview_core::{AppError, UnitPreference, ValidationError, WeatherConfig};
use skyview_weather::{UnitSystem, WeatherError, WeatherProvider, WeatherSnapshot};
use tokio::runtime::Handle;

use crate::forms::validate_city;
use crate::models::auth_model::AuthModel;
use crate::notification::Notification;
use crate::services::{request_weather_fetch, WeatherServiceMessage};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DashboardState {
    #[default]
    IdleNoData,
    Loading,
    Loaded(WeatherSnapshot),
    /// Last fetch failed; the message was also sent as a notification
    Error(String),
}

/// What the weather panel renders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panel<'a> {
    Loading,
    Weather(&'a WeatherSnapshot),
    Placeholder,
}

fn unit_system_for(preference: UnitPreference) -> UnitSystem {
    match preference {
        UnitPreference::Metric => UnitSystem::Metric,
        UnitPreference::Imperial => UnitSystem::Imperial,
    }
}

pub struct DashboardModel<P: IdentityProvider = SupabaseAuth> {
    gateway: Arc<IdentityGateway<P>>,
    provider: Arc<WeatherProvider>,
    runtime: Handle,
    tx: Sender<WeatherServiceMessage>,
    rx: Receiver<WeatherServiceMessage>,
    state: DashboardState,
    city: String,
    unit_system: UnitSystem,
    quick_picks: Vec<String>,
    latest_seq: u64,
    notifications: Vec<Notification>,
}

impl<P: IdentityProvider> DashboardModel<P> {
    pub fn new(
        gateway: Arc<IdentityGateway<P>>,
        provider: Arc<WeatherProvider>,
        runtime: Handle,
        config: &WeatherConfig,
    ) -> Self {
        let (tx, rx) = channel();
        Self {
            gateway,
            provider,
            runtime,
            tx,
            rx,
            state: DashboardState::IdleNoData,
            city: config.default_city.trim().to_string(),
            unit_system: unit_system_for(config.unit_system),
            quick_picks: config
                .quick_picks
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
            latest_seq: 0,
            notifications: Vec::new(),
        }
    }

    /// Start showing the dashboard: fetch the default city.
    pub fn mount(&mut self) {
        tracing::info!("Dashboard mounted for {}", self.greeting_name());
        self.fetch();
    }

    /// Stop showing the dashboard. Results of in-flight fetches are discarded.
    pub fn unmount(&mut self) {
        self.latest_seq += 1;
        self.state = DashboardState::IdleNoData;
    }

    /// Search for a city. Input is trimmed; blank input is ignored.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyCity` without fetching when the trimmed
    /// input is empty.
    pub fn search(&mut self, query: &str) -> Result<(), ValidationError> {
        let city = validate_city(query)?;
        self.city = city;
        self.fetch();
        Ok(())
    }

    /// Quick-pick shortcut. Re-selecting the current city re-fetches it.
    ///
    /// # Errors
    /// Same as [`search`](Self::search).
    pub fn select_city(&mut self, city: &str) -> Result<(), ValidationError> {
        self.search(city)
    }

    /// Switch units and re-fetch. Returns false (and does nothing) when
    /// `unit` is already selected.
    pub fn set_unit_system(&mut self, unit: UnitSystem) -> bool {
        if unit == self.unit_system {
            return false;
        }
        self.unit_system = unit;
        self.fetch();
        true
    }

    /// Flip between metric and imperial; always issues exactly one fetch.
    pub fn toggle_unit_system(&mut self) {
        self.set_unit_system(self.unit_system.toggled());
    }

    /// Sign out through `auth` and discard any pending weather results.
    pub fn logout(&mut self, auth: &mut AuthModel<P>) {
        self.unmount();
        auth.logout();
    }

    fn fetch(&mut self) {
        self.latest_seq += 1;
        let seq = self.latest_seq;

        if !self.provider.has_api_key() {
            self.apply(seq, Err(WeatherError::MissingApiKey));
            return;
        }

        tracing::debug!(
            "Fetch #{}: {} ({})",
            seq,
            self.city,
            self.unit_system.as_query()
        );
        self.state = DashboardState::Loading;
        request_weather_fetch(
            &self.tx,
            &self.runtime,
            Arc::clone(&self.provider),
            seq,
            self.city.clone(),
            self.unit_system,
        );
    }

    /// Apply finished fetches. Returns true if the state changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;

        while let Ok(msg) = self.rx.try_recv() {
            let WeatherServiceMessage::FetchDone {
                seq,
                city,
                units,
                result,
            } = msg;

            if seq != self.latest_seq {
                tracing::debug!(
                    "Dropping stale result #{} for {} ({}); latest is #{}",
                    seq,
                    city,
                    units.as_query(),
                    self.latest_seq
                );
                continue;
            }

            self.apply(seq, result);
            changed = true;
        }

        changed
    }

    fn apply(&mut self, seq: u64, result: Result<WeatherSnapshot, WeatherError>) {
        match result {
            Ok(snapshot) => {
                tracing::info!(
                    "Fetch #{}: {}, {} {}",
                    seq,
                    snapshot.city,
                    snapshot.country,
                    snapshot.temperature_display()
                );
                self.state = DashboardState::Loaded(snapshot);
            }
            Err(e) => {
                let err = AppError::from(e);
                tracing::error!("Weather fetch failed: {}", err);
                self.notifications.push(Notification::from(&err));
                self.state = DashboardState::Error(err.user_message());
            }
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn panel(&self) -> Panel<'_> {
        match &self.state {
            DashboardState::Loading => Panel::Loading,
            DashboardState::Loaded(snapshot) => Panel::Weather(snapshot),
            DashboardState::IdleNoData | DashboardState::Error(_) => Panel::Placeholder,
        }
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match &self.state {
            DashboardState::Loaded(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == DashboardState::Loading
    }

    pub fn selected_city(&self) -> &str {
        &self.city
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    pub fn quick_picks(&self) -> &[String] {
        &self.quick_picks
    }

    pub fn greeting_name(&self) -> String {
        self.gateway
            .current_user()
            .map(|u| u.greeting_name())
            .unwrap_or_else(|| "User".to_string())
    }

    /// Round a temperature from the loaded snapshot.
    ///
    /// A loaded snapshot is always in the selected units because every unit
    /// change clears it and re-fetches, so no conversion happens here.
    pub fn display_temperature(&self, value: f64) -> i64 {
        value.round() as i64
    }

    /// Drain queued notifications
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use skyview_auth::SessionStore;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn body(city: &str, temp: f64) -> serde_json::Value {
        serde_json::json!({
            "name": city,
            "sys": { "country": "GB", "sunrise": 1_700_000_000, "sunset": 1_700_030_000 },
            "main": { "temp": temp, "feels_like": temp, "temp_min": temp - 1.0,
                      "temp_max": temp + 1.0, "humidity": 70 },
            "weather": [{ "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 3.6 },
            "timezone": 0
        })
    }

    async fn mount_city(server: &MockServer, city: &str, units: &str, temp: f64, expect: u64) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", city))
            .and(query_param("units", units))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(city, temp)))
            .expect(expect)
            .mount(server)
            .await;
    }

    fn build(server_uri: &str, api_key: Option<&str>, dir: &std::path::Path) -> DashboardModel {
        let store = Arc::new(SessionStore::new(dir));
        store.restore();
        let auth = Arc::new(SupabaseAuth::new("http://127.0.0.1:9", "anon-key").unwrap());
        let provider = Arc::new(
            WeatherProvider::with_base_url(api_key.map(String::from), server_uri).unwrap(),
        );
        DashboardModel::new(
            Arc::new(IdentityGateway::new(auth, store)),
            provider,
            Handle::current(),
            &WeatherConfig::default(),
        )
    }

    async fn settle(model: &mut DashboardModel) {
        for _ in 0..300 {
            model.poll_channel();
            if !model.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("dashboard never left loading");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mount_loads_default_city_in_metric() {
        let server = MockServer::start().await;
        mount_city(&server, "Ahmedabad", "metric", 31.4, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        assert_eq!(model.panel(), Panel::Placeholder);
        model.mount();
        assert_eq!(model.panel(), Panel::Loading);
        settle(&mut model).await;

        let snapshot = model.snapshot().unwrap();
        assert_eq!(snapshot.city, "Ahmedabad");
        assert_eq!(model.display_temperature(snapshot.temperature), 31);
        assert_eq!(model.greeting_name(), "User");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), None, dir.path());

        model.search("Paris").unwrap();

        assert!(matches!(model.state(), DashboardState::Error(_)));
        assert_eq!(model.panel(), Panel::Placeholder);
        let notes = model.take_notifications();
        assert_eq!(notes[0].title, "API Key Missing");
        assert_eq!(notes[0].description, "OpenWeatherMap API key is not configured.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_city_clears_snapshot() {
        let server = MockServer::start().await;
        mount_city(&server, "London", "metric", 12.0, 1).await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Atlantis"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404", "message": "city not found"
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        model.search("London").unwrap();
        settle(&mut model).await;
        assert!(model.snapshot().is_some());

        model.search("Atlantis").unwrap();
        settle(&mut model).await;

        assert!(model.snapshot().is_none());
        assert_eq!(model.panel(), Panel::Placeholder);
        let notes = model.take_notifications();
        assert_eq!(notes[0].title, "Weather Fetch Error");
        assert_eq!(notes[0].description, "City not found. Please check the spelling.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_search_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        assert_eq!(model.search("   "), Err(ValidationError::EmptyCity));
        assert_eq!(model.state(), &DashboardState::IdleNoData);
        assert!(model.take_notifications().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn search_trims_and_reselect_refetches() {
        let server = MockServer::start().await;
        mount_city(&server, "New York", "metric", 20.0, 2).await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        model.search("  New York ").unwrap();
        settle(&mut model).await;
        assert_eq!(model.selected_city(), "New York");

        model.select_city("New York").unwrap();
        settle(&mut model).await;
        assert_eq!(model.snapshot().unwrap().city, "New York");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn each_toggle_fetches_once_in_new_units() {
        let server = MockServer::start().await;
        mount_city(&server, "Ahmedabad", "metric", 30.0, 2).await;
        mount_city(&server, "Ahmedabad", "imperial", 86.0, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        model.mount();
        settle(&mut model).await;

        model.toggle_unit_system();
        assert_eq!(model.unit_system(), UnitSystem::Imperial);
        settle(&mut model).await;
        let snapshot = model.snapshot().unwrap();
        assert_eq!(snapshot.unit_system, UnitSystem::Imperial);
        assert_eq!(model.display_temperature(snapshot.temperature), 86);

        // Selecting the active unit is a no-op
        assert!(!model.set_unit_system(UnitSystem::Imperial));

        model.toggle_unit_system();
        settle(&mut model).await;
        assert_eq!(model.snapshot().unwrap().unit_system, UnitSystem::Metric);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_earlier_fetch_does_not_overwrite_newer_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body("London", 12.0))
                    .set_delay(Duration::from_millis(400)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_city(&server, "Paris", "metric", 18.0, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        model.search("London").unwrap();
        model.search("Paris").unwrap();
        settle(&mut model).await;
        assert_eq!(model.snapshot().unwrap().city, "Paris");

        // Give the slow London response time to arrive, then drain it
        tokio::time::sleep(Duration::from_millis(600)).await;
        model.poll_channel();
        assert_eq!(model.snapshot().unwrap().city, "Paris");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unmount_discards_in_flight_result() {
        let server = MockServer::start().await;
        mount_city(&server, "Tokyo", "metric", 22.0, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        model.search("Tokyo").unwrap();
        model.unmount();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!model.poll_channel());
        assert_eq!(model.state(), &DashboardState::IdleNoData);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn toggle_clears_metric_snapshot_until_imperial_lands() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Dubai"))
            .and(query_param("units", "imperial"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body("Dubai", 77.4))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_city(&server, "Dubai", "metric", 25.0, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut model = build(&server.uri(), Some("key"), dir.path());

        model.search("Dubai").unwrap();
        settle(&mut model).await;
        assert_eq!(model.display_temperature(model.snapshot().unwrap().temperature), 25);

        model.toggle_unit_system();
        assert!(model.is_loading());
        assert!(model.snapshot().is_none());
        assert_eq!(model.panel(), Panel::Loading);

        settle(&mut model).await;
        let snapshot = model.snapshot().unwrap();
        assert_eq!(snapshot.unit_system, UnitSystem::Imperial);
        assert_eq!(model.display_temperature(snapshot.temperature), 77);
    }
}
