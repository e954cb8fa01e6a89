use serde::{Deserialize, Serialize};

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

/// Unit system used for the provider query and the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Celsius, m/s
    #[default]
    Metric,
    /// Fahrenheit, mph
    Imperial,
}

impl UnitSystem {
    /// Value of the `units` query parameter
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// The other unit system
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Metric => Self::Imperial,
            Self::Imperial => Self::Metric,
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

/// Round a Celsius reading for display in the given unit system.
///
/// Fahrenheit is derived as `round(c * 9/5 + 32)`. Only valid for values
/// fetched in metric units; snapshots fetched in imperial units already hold
/// Fahrenheit and must not be passed through here.
pub fn display_temperature(celsius: f64, unit: UnitSystem) -> i64 {
    let value = match unit {
        UnitSystem::Metric => celsius,
        UnitSystem::Imperial => celsius * 9.0 / 5.0 + 32.0,
    };
    value.round() as i64
}

/// Current conditions for one city under one unit system.
///
/// Replaced wholesale on every successful fetch; never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    /// Current temperature in the units of `unit_system`
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Provider condition text, e.g. "scattered clouds"
    pub condition: String,
    /// Provider icon identifier, e.g. "03d"
    pub icon_code: String,
    pub humidity: u8,
    /// m/s for metric, mph for imperial
    pub wind_speed: f64,
    /// City-local time, e.g. "06:12 AM"
    pub sunrise: String,
    pub sunset: String,
    /// Client-local "today" label; not derived from the fetched data
    pub date: String,
    pub unit_system: UnitSystem,
}

impl WeatherSnapshot {
    pub fn icon_url(&self) -> String {
        format!("{}/{}@2x.png", ICON_URL_BASE, self.icon_code)
    }

    /// Wind speed formatted for display ("13 km/h" or "8 mph")
    pub fn wind_display(&self) -> String {
        match self.unit_system {
            UnitSystem::Metric => format!("{} km/h", (self.wind_speed * 3.6).round() as i64),
            UnitSystem::Imperial => format!("{} mph", self.wind_speed.round() as i64),
        }
    }

    /// Current temperature rounded with its unit symbol
    pub fn temperature_display(&self) -> String {
        format!(
            "{}{}",
            self.temperature.round() as i64,
            self.unit_system.temperature_symbol()
        )
    }

    /// Condition text with each word capitalized ("Light Rain")
    pub fn condition_display(&self) -> String {
        self.condition
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Weather gateway errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// No API credential configured; raised before any network call.
    #[error("Weather API key is not configured")]
    MissingApiKey,
    #[error("City not found: {0}")]
    CityNotFound(String),
    /// Non-success status, network failure or malformed body.
    #[error("Weather provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Provider(e.to_string())
    }
}
