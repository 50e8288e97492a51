pub mod admin;
pub mod metrics;
pub mod partner_key;

pub use admin::admin_auth_middleware;
pub use metrics::metrics_middleware;
pub use partner_key::partner_key_middleware;
