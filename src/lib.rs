//! Monitoring coverage gap engine library.

pub mod analysis;
pub mod config;
pub mod correlation;
pub mod http;
pub mod ingestion;
pub mod inventory;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod parser;
pub mod pool;
pub mod resilience;

pub use config::schema::GapwatchConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
