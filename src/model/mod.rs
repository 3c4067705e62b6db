//! Core data model.
//!
//! # Data Flow
//! ```text
//! raw log line
//!     → parser produces a CallEvent (no pod identity, no sequence)
//!     → pool store stamps pod + sequence and stores a CallRecord
//!     → analysis aggregates records under EndpointKey
//!     → classifier emits CoverageGap values against the inventories
//! ```
//!
//! # Design Decisions
//! - CallRecord is immutable once appended; the store hands out clones
//! - EndpointKey lower-cases the endpoint template at construction so the
//!   derived equality is the case-insensitive one the aggregation needs
//! - Inventory descriptors are external, read-only inputs

pub mod gap;
pub mod inventory;
pub mod record;

pub use gap::{CoverageGap, GapPriority};
pub use inventory::{AlertDescriptor, AlertSeverity, MetricDescriptor, MetricSourceKind};
pub use record::{CallEvent, CallRecord, EndpointKey};
