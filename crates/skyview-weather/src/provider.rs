//! OpenWeatherMap "current conditions by city name" client.

use crate::format::{format_local_time, today_label};
use crate::types::{UnitSystem, WeatherError, WeatherSnapshot};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
const USER_AGENT: &str = "SkyView/0.1.0";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    name: String,
    sys: ApiSys,
    main: ApiMain,
    weather: Vec<ApiCondition>,
    wind: ApiWind,
    /// Shift in seconds from UTC
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

impl ApiResponse {
    fn into_snapshot(self, unit_system: UnitSystem) -> Result<WeatherSnapshot, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Provider("Response has no weather condition".into()))?;

        let sunrise = format_local_time(self.sys.sunrise, self.timezone)
            .ok_or_else(|| WeatherError::Provider("Sunrise timestamp out of range".into()))?;
        let sunset = format_local_time(self.sys.sunset, self.timezone)
            .ok_or_else(|| WeatherError::Provider("Sunset timestamp out of range".into()))?;

        Ok(WeatherSnapshot {
            city: self.name,
            country: self.sys.country,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            condition: condition.description,
            icon_code: condition.icon,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            sunrise,
            sunset,
            date: today_label(),
            unit_system,
        })
    }
}

/// Weather gateway. One request per call; no caching, no retry.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherProvider {
    /// Create a provider against the public OpenWeatherMap API.
    ///
    /// A missing key is accepted here and reported by `fetch_weather`.
    pub fn new(api_key: Option<String>) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, OPENWEATHER_API_BASE)
    }

    /// Create a provider against an alternate base URL (proxies, tests).
    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Result<Self, WeatherError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch current conditions for `city` in `units`.
    ///
    /// # Errors
    /// - `MissingApiKey` before any network call when no key is configured
    /// - `CityNotFound` when the provider answers 404
    /// - `Provider` for any other status, network failure or malformed body
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_weather(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", units.as_query())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Provider has no city named {:?}", city);
            return Err(WeatherError::CityNotFound(city.to_string()));
        }
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_u16().to_string());
            return Err(WeatherError::Provider(reason));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Provider(format!("Invalid response: {}", e)))?;

        let snapshot = body.into_snapshot(units)?;
        tracing::info!(
            "Fetched weather for {}, {} ({})",
            snapshot.city,
            snapshot.country,
            units.as_query()
        );
        Ok(snapshot)
    }
}
