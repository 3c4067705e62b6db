//! Gap classification and report assembly.
//!
//! # Data Flow
//! ```text
//! Analysis request (window, service, teams)
//!     → InventoryHub (alert + metric snapshots, each degrading alone)
//!     → PoolStore snapshot → call volume per EndpointKey
//!     → correlation per endpoint → classifier → sorted CoverageGap list
//!     → GapReport (gaps + input accounting + inventory annotations)
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function of (volume, coverage, thresholds);
//!   identical inputs reproduce the identical gap list
//! - The report is assembled once and never mutated afterwards

pub mod classifier;
pub mod report;
pub mod runner;

pub use classifier::{sort_gaps, GapClassifier};
pub use report::{GapReport, InputAccounting, InventoryAnnotation};
pub use runner::{run_analysis, AnalysisRequest};
