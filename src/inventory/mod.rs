//! Alert and metric inventories.
//!
//! # Responsibilities
//! - Define the upstream source traits the engine consumes
//! - Fetch inventories over HTTP with bounded retries
//! - Cache snapshots per team/scope with a TTL and last-good fallback
//!
//! # Data Flow
//! ```text
//! Analysis run asks for one team or scope
//!     → fresh cache entry → snapshot (fresh)
//!     → else retried upstream fetch → snapshot (fresh, cached)
//!     → else last good cache entry → snapshot (stale)
//!     → else empty snapshot (unavailable)
//! ```
//!
//! # Design Decisions
//! - The cache is an explicit object handed around by reference, with
//!   timestamped entries; freshness is decided at lookup time
//! - A failed team or scope degrades alone; the analysis run continues

pub mod cache;
pub mod http;
pub mod hub;
pub mod source;

pub use cache::{InventoryCache, InventoryFreshness};
pub use http::{HttpAlertSource, HttpMetricSource};
pub use hub::{InventoryHub, InventorySnapshot};
pub use source::{AlertSource, MetricSource, SourceError};
