//! Centralized error types for the SkyView application.
//!
//! This module provides the error taxonomy every user-initiated operation
//! resolves to:
//! - `Validation` for form input rejected before any remote call
//! - `Auth` for identity provider rejections, message passed through verbatim
//! - `Config` for missing or malformed settings (e.g. the weather API key)
//! - `NotFound` / `Provider` for weather fetch failures
//!
//! Every variant renders into a transient notification via `title()` and
//! `user_message()`; none of them is allowed to escape as a crash.

use thiserror::Error;

/// Top-level application error type.
///
/// All errors reaching the presentation layer should be convertible to this
/// type. Use `title()` and `user_message()` to build the notification.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The weather provider does not know the requested city.
    #[error("City not found: {0}")]
    NotFound(String),

    /// Any other weather provider failure, network failures included.
    #[error("Weather provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Notification title for this error.
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Config(ConfigError::MissingSetting(_)) => "API Key Missing",
            AppError::NotFound(_) | AppError::Provider(_) => "Weather Fetch Error",
            _ => "Error",
        }
    }

    /// Returns the message suitable for display in the UI.
    ///
    /// Identity provider messages are surfaced verbatim; weather failures
    /// carry the provider's status text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Auth(e) => e.user_message(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::NotFound(_) => "City not found. Please check the spelling.".to_string(),
            AppError::Provider(detail) if detail.is_empty() => {
                "Failed to fetch weather data. Please try again.".to_string()
            }
            AppError::Provider(detail) => format!("Error: {}", detail),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Form input rejected locally, before any gateway is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Passwords don't match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Please enter a city name")]
    EmptyCity,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "OpenWeatherMap API key is not configured.",
        }
    }
}

/// Authentication errors (identity provider, local profile storage).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider rejected the request; message is verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),

    #[error("Profile storage error: {0}")]
    StorageError(String),

    #[error("Not signed in")]
    NotSignedIn,
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected(msg) => msg.clone(),
            AuthError::Unreachable(msg) => msg.clone(),
            AuthError::StorageError(_) => "Failed to save your profile. Please try again.".to_string(),
            AuthError::NotSignedIn => "Not signed in. Please sign in.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = ValidationError::MissingFields.into();
        assert!(matches!(err, AppError::Validation(ValidationError::MissingFields)));
    }

    #[test]
    fn test_auth_message_is_verbatim() {
        let err = AppError::Auth(AuthError::Rejected("Invalid login credentials".into()));
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert_eq!(err.title(), "Error");
    }

    #[test]
    fn test_missing_api_key_notification() {
        let err = AppError::Config(ConfigError::MissingSetting("weather.api_key".into()));
        assert_eq!(err.title(), "API Key Missing");
        assert_eq!(err.user_message(), "OpenWeatherMap API key is not configured.");
    }

    #[test]
    fn test_weather_errors() {
        let not_found = AppError::NotFound("Atlantis".into());
        assert_eq!(not_found.title(), "Weather Fetch Error");
        assert!(not_found.user_message().contains("City not found"));

        let provider = AppError::Provider("Unauthorized".into());
        assert_eq!(provider.user_message(), "Error: Unauthorized");
    }

    #[test]
    fn test_password_too_short_message() {
        let err = ValidationError::PasswordTooShort { min: 6 };
        assert_eq!(err.to_string(), "Password must be at least 6 characters long");
    }
}
