//! HTTP handlers for partner-service.

pub mod admin;
pub mod auth;
pub mod checking;
pub mod metrics;

pub use auth::admin_login;
pub use checking::check_worker;
