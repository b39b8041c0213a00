//! Infrastructure layer - store backends, caches, routing and service wiring

pub mod cache;
pub mod history;
pub mod logging;
pub mod observability;
pub mod registry;
pub mod routing;
pub mod services;
pub mod store;
