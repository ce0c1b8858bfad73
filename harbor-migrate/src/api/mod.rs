//! HTTP API handlers for harbor-migrate

pub mod form_fields;
pub mod health;
pub mod migrate;

pub use form_fields::FormFields;
pub use health::health_routes;
pub use migrate::migrate_routes;
