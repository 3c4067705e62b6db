//! Similarity-based matching of endpoints against inventory candidates.
//!
//! The engine is pure: no I/O, no clocks. Given the same endpoint and the
//! same inventories it returns bit-identical matches regardless of input
//! order, which is what makes analysis runs reproducible.

use std::collections::BTreeSet;

use crate::config::CorrelationConfig;
use crate::correlation::tokens::{jaccard, Tokenizer};
use crate::model::{AlertDescriptor, EndpointKey, MetricDescriptor};

/// One accepted candidate with the score that won it.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatch {
    pub name: String,
    pub score: f64,
}

/// Correlation verdict for one endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correlation {
    pub metric: Option<CorrelationMatch>,
    pub alert: Option<CorrelationMatch>,
}

#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    threshold: f64,
    tokenizer: Tokenizer,
}

impl CorrelationEngine {
    pub fn new(threshold: f64, stop_segments: impl IntoIterator<Item = String>) -> Self {
        Self {
            threshold,
            tokenizer: Tokenizer::new(stop_segments),
        }
    }

    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(config.threshold, config.stop_segments.iter().cloned())
    }

    /// Match one endpoint against both inventories.
    ///
    /// Metrics match on their name. Alerts match on `target_pattern`, falling
    /// back to the alert id, and are reported by id. The best candidate wins
    /// iff its score reaches the threshold; ties go to the higher score, then
    /// the lexicographically smaller reported name.
    pub fn correlate(
        &self,
        endpoint: &EndpointKey,
        metrics: &[MetricDescriptor],
        alerts: &[AlertDescriptor],
    ) -> Correlation {
        let endpoint_tokens = self.tokenizer.tokenize_endpoint(endpoint);
        let metric = self.best_match(
            &endpoint_tokens,
            metrics.iter().map(|m| (m.name.as_str(), m.name.as_str())),
        );
        let alert = self.best_match(
            &endpoint_tokens,
            alerts.iter().map(|a| (a.id.as_str(), a.match_surface())),
        );
        Correlation { metric, alert }
    }

    /// Candidates arrive as `(reported name, match surface)` pairs.
    fn best_match<'a>(
        &self,
        endpoint_tokens: &BTreeSet<String>,
        candidates: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Option<CorrelationMatch> {
        let mut best: Option<CorrelationMatch> = None;
        for (name, surface) in candidates {
            let score = jaccard(endpoint_tokens, &self.tokenizer.tokenize(surface));
            if score < self.threshold {
                continue;
            }
            let better = match &best {
                None => true,
                Some(current) => {
                    score > current.score
                        || (score == current.score && name < current.name.as_str())
                }
            };
            if better {
                best = Some(CorrelationMatch {
                    name: name.to_string(),
                    score,
                });
            }
        }
        best
    }
}
