//! Weather gateway for SkyView
//!
//! Fetches current conditions by city name from the OpenWeatherMap API and
//! normalizes them into a `WeatherSnapshot`.

pub mod format;
pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::*;
