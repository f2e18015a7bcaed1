//! HTTP route handlers.

pub mod donations;
pub mod health;
pub mod metrics;
