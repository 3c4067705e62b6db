//! Endpoint-to-inventory correlation.
//!
//! # Responsibilities
//! - Reduce endpoints and inventory names to comparable token sets
//! - Score candidates by Jaccard overlap against a configurable threshold
//! - Resolve ties deterministically so repeated runs agree
//!
//! # Design Decisions
//! - Pure functions and value types only; the inventories arrive by
//!   reference and the clock never enters scoring
//! - Stop segments are applied to both sides of the comparison

pub mod engine;
pub mod tokens;

pub use engine::{Correlation, CorrelationEngine, CorrelationMatch};
pub use tokens::{jaccard, Tokenizer, DEFAULT_STOP_SEGMENTS};
