//! Headless presentation layer: the models a view binds to, the service
//! channels that carry async results back to them, and the application
//! context that owns the runtime and gateways.

pub mod app_services;
pub mod error_mapping;
pub mod forms;
pub mod models;
pub mod notification;
pub mod services;

pub use app_services::AppServices;
pub use forms::{LoginForm, SignupForm};
pub use models::auth_model::{AuthMode, AuthModel, AuthView};
pub use models::dashboard_model::{DashboardModel, DashboardState, Panel};
pub use notification::{Notification, NotificationVariant};
