//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Analysis run ID flows through run logs and reports
//! - Metrics are cheap (atomic increments)
//! - Exposition runs on its own address, separate from the API

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
