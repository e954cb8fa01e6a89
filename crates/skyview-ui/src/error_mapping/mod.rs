//! Conversions from domain errors into [`AppError`](skyview_core::AppError),
//! the single type the models turn into notifications.

mod auth;
mod weather;
