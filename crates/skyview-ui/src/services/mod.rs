pub mod auth_service;
pub mod weather_service;

pub use auth_service::{
    request_login, request_logout, request_signup, AuthServiceMessage,
};
pub use weather_service::{request_fetch as request_weather_fetch, WeatherServiceMessage};
