use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable carrying the weather provider API key.
pub const ENV_WEATHER_API_KEY: &str = "SKYVIEW_WEATHER_API_KEY";
/// Environment variable carrying the identity provider base URL.
pub const ENV_IDENTITY_URL: &str = "SKYVIEW_SUPABASE_URL";
/// Environment variable carrying the identity provider anonymous key.
pub const ENV_IDENTITY_ANON_KEY: &str = "SKYVIEW_SUPABASE_ANON_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Identity provider settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Local profile storage
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Unit system used for weather queries and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitPreference {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. Usually supplied via `SKYVIEW_WEATHER_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the current-conditions API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Unit system selected when the dashboard mounts
    #[serde(default)]
    pub unit_system: UnitPreference,

    /// City fetched when the dashboard mounts
    #[serde(default = "default_city")]
    pub default_city: String,

    /// One-click search shortcuts
    #[serde(default = "default_quick_picks")]
    pub quick_picks: Vec<String>,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_city() -> String {
    "Ahmedabad".to_string()
}

fn default_quick_picks() -> Vec<String> {
    [
        "Ahmedabad",
        "London",
        "Dubai",
        "Tokyo",
        "Paris",
        "New York",
        "Mumbai",
        "Sydney",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            unit_system: UnitPreference::Metric,
            default_city: default_city(),
            quick_picks: default_quick_picks(),
        }
    }
}

impl WeatherConfig {
    /// API key if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Identity provider (Supabase Auth) configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,
    /// Public anonymous key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: String,
}

impl IdentityConfig {
    /// Check if the identity provider is configured (not placeholders)
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
            && !self.anon_key.is_empty()
            && !self.anon_key.starts_with("YOUR_")
    }
}

/// Local profile storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted profile record.
    /// Defaults to `<config_dir>/profile`.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skyview");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            identity: IdentityConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Directory the session store persists the profile record in
    pub fn profile_dir(&self) -> PathBuf {
        self.storage
            .profile_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("profile"))
    }

    /// Load configuration from file, creating default if it doesn't exist,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from an explicit path without environment overrides
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Override settings from the environment. Blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_WEATHER_API_KEY) {
            self.weather.api_key = Some(key);
        }
        if let Some(url) = get(ENV_IDENTITY_URL) {
            self.identity.url = url;
        }
        if let Some(key) = get(ENV_IDENTITY_ANON_KEY) {
            self.identity.anon_key = key;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.api_key().is_none() {
            result.add_warning(
                "weather.api_key",
                format!("Weather API key not set - set {}", ENV_WEATHER_API_KEY),
            );
        }

        if self.weather.default_city.trim().is_empty() {
            result.add_error("weather.default_city", "Default city cannot be empty");
        }

        if self.weather.quick_picks.iter().any(|c| c.trim().is_empty()) {
            result.add_warning("weather.quick_picks", "Blank quick-pick entries are ignored");
        }

        if self.identity.is_configured() {
            self.validate_url(&self.identity.url, "identity.url", &mut result);
        } else {
            result.add_warning(
                "identity",
                "Identity provider not configured - sign in will be unavailable",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skyview");

        Ok(config_dir.join("config.toml"))
    }
}
