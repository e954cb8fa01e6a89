use skyview_core::{AppError, ConfigError};
use skyview_weather::WeatherError;

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::MissingApiKey => {
                AppError::Config(ConfigError::MissingSetting("weather.api_key".into()))
            }
            WeatherError::CityNotFound(city) => AppError::NotFound(city),
            WeatherError::Provider(detail) => AppError::Provider(detail),
        }
    }
}
