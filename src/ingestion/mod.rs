//! Log ingestion.
//!
//! # Responsibilities
//! - Poll the platform log source once per pod on independent tickers
//! - Push parsed call records into the pool, counting skips
//! - Accept pushed line batches from the HTTP submit endpoint
//! - Run the retention eviction timer
//!
//! # Data Flow
//! ```text
//! Per-pod ticker fires
//!     → LogSource::fetch_lines (retried; failure keeps the cursor)
//!     → LineParser (unparseable lines counted as skips, never fatal)
//!     → PoolStore::append
//!
//! Eviction ticker fires
//!     → PoolStore::evict under the currently configured policy
//! ```
//!
//! # Design Decisions
//! - Workers share nothing but the pool; one pod stalling never blocks
//!   another
//! - A failed poll leaves the cursor in place so lines are re-fetched, not
//!   lost; the pool tolerates replayed lines
//! - All loops select on the broadcast shutdown signal

pub mod scheduler;
pub mod source;
pub mod worker;

pub use scheduler::{spawn_eviction_timer, spawn_workers};
pub use source::{HttpLogSource, LogSource};
pub use worker::{ingest_lines, IngestOutcome, PodWorker};
