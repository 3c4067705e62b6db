//! Resilience for outbound calls.
//!
//! # Data Flow
//! ```text
//! Call to a log or inventory upstream:
//!     → retries.rs (per-attempt deadline via tokio timeout)
//!     → On failure: backoff.rs (jittered exponential delay), retry
//!     → On exhaustion: caller degrades (cached inventory, skipped poll)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline; there is no unbounded wait
//! - Attempt budgets are small and configurable per upstream
//! - Exhaustion is an error for the caller to absorb, not a panic

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{with_retries, RetryError, RetryPlan};
