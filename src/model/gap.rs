//! Derived coverage-gap types.

use serde::{Deserialize, Serialize};

use crate::model::record::EndpointKey;

/// Gap priority, most urgent first.
///
/// Declaration order drives `Ord`, which drives report ordering: Critical
/// sorts before Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GapPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for GapPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GapPriority::Critical => "CRITICAL",
            GapPriority::High => "HIGH",
            GapPriority::Medium => "MEDIUM",
            GapPriority::Low => "LOW",
        };
        f.write_str(s)
    }
}

/// One endpoint template that traffic hits but monitoring misses.
///
/// Recomputed per analysis run from the pool plus the inventories; never the
/// source of truth for anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub endpoint: EndpointKey,
    /// Calls observed in the analysis window.
    pub call_volume: u64,
    pub has_metric: bool,
    pub has_alert: bool,
    pub priority: GapPriority,
    /// Best-matching metric name, when one cleared the threshold.
    pub matched_metric: Option<String>,
    /// Best-matching alert id, when one cleared the threshold.
    pub matched_alert: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(GapPriority::Critical < GapPriority::High);
        assert!(GapPriority::High < GapPriority::Medium);
        assert!(GapPriority::Medium < GapPriority::Low);
    }

    #[test]
    fn test_priority_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&GapPriority::Critical).unwrap(),
            "\"CRITICAL\""
        );
    }
}
