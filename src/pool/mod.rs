//! Bounded retention pool for normalized call records.
//!
//! # Responsibilities
//! - Hold call records well past the platform's short log retention window
//! - Serve snapshot-consistent range queries to the analysis pipeline
//! - Enforce the retention policy on a schedule independent of ingestion
//! - Optionally persist records across restarts as JSON lines
//!
//! # Data Flow
//! ```text
//! Ingestion (workers, submit endpoint)
//!     → PoolStore::append (stamp pod + sequence, write-through to file)
//!     → active tail, sealed into immutable segments at capacity
//!
//! Analysis / pool queries
//!     → PoolStore::query → PoolQuery (owned snapshot, lazily iterated)
//!
//! Eviction timer
//!     → PoolStore::evict → rebuilt segment list + compacted backing file
//! ```
//!
//! # Design Decisions
//! - One write lane serializes appends, sealing, and eviction; readers only
//!   take that lock long enough to copy the bounded active tail
//! - Sealed segments are immutable `Arc`s published through `ArcSwap`, so a
//!   query iterates a stable snapshot while the store moves on
//! - Persistence is write-ahead per append and compacted on eviction, with
//!   torn trailing lines skipped on replay

pub mod persist;
pub mod retention;
pub mod store;

pub use retention::{EvictionStats, RetentionPolicy};
pub use store::{PoolQuery, PoolStatus, PoolStore, QueryFilter, StoreError, TimeRange};
