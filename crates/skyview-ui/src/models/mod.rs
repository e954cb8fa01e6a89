pub mod auth_model;
pub mod dashboard_model;
