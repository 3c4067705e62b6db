//! Immutable analysis output.
//!
//! The assembler only copies classifier output and stamps run identity; all
//! computation happens upstream, so a report can be handed to any renderer
//! without re-deriving anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inventory::InventoryFreshness;
use crate::model::CoverageGap;
use crate::pool::TimeRange;

/// How much input fed the run, for sanity-checking surprising reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAccounting {
    pub records_scanned: u64,
    pub distinct_endpoints: u64,
}

/// Condition of one inventory fetch that fed the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAnnotation {
    /// Which inventory: `alerts` or `metrics`.
    pub inventory: String,
    /// Team name or metric scope the fetch covered.
    pub scope: String,
    pub freshness: InventoryFreshness,
}

/// Output of one gap-analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub window: TimeRange,
    pub service: Option<String>,
    /// Sorted by priority, volume descending, endpoint.
    pub gaps: Vec<CoverageGap>,
    pub inputs: InputAccounting,
    /// One entry per inventory fetch: stale or unavailable entries mean the
    /// run completed on partial data.
    pub inventories: Vec<InventoryAnnotation>,
}

impl GapReport {
    pub fn assemble(
        window: TimeRange,
        service: Option<String>,
        gaps: Vec<CoverageGap>,
        inputs: InputAccounting,
        inventories: Vec<InventoryAnnotation>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            window,
            service,
            gaps,
            inputs,
            inventories,
        }
    }

    /// True when every inventory that fed the run was fetched fresh.
    pub fn complete(&self) -> bool {
        self.inventories
            .iter()
            .all(|a| a.freshness == InventoryFreshness::Fresh)
    }
}
