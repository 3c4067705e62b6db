//! Token extraction for similarity scoring.
//!
//! Endpoints and inventory names live in different alphabets (`/items/{id}`
//! vs `http_server_requests_items_get`), so both sides are reduced to
//! lower-case alphanumeric token sets before comparison.

use std::collections::BTreeSet;

use crate::model::EndpointKey;

/// Segments carrying no signal for matching. `{id}` placeholders tokenize to
/// `id`, so the placeholder is dropped through this list as well.
pub const DEFAULT_STOP_SEGMENTS: &[&str] = &["api", "v1", "v2", "internal", "id"];

/// Splits raw strings into normalized token sets.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_segments: BTreeSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_SEGMENTS.iter().map(|s| s.to_string()))
    }
}

impl Tokenizer {
    pub fn new(stop_segments: impl IntoIterator<Item = String>) -> Self {
        Self {
            stop_segments: stop_segments
                .into_iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Split on every non-alphanumeric boundary, lower-case, drop stop
    /// segments. Deterministic for any input order (`BTreeSet`).
    pub fn tokenize(&self, raw: &str) -> BTreeSet<String> {
        raw.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_ascii_lowercase())
            .filter(|t| !self.stop_segments.contains(t))
            .collect()
    }

    /// Endpoint tokens include the request method; a metric named
    /// `..._items_get` should outscore `..._items_delete` for `GET /items`.
    pub fn tokenize_endpoint(&self, key: &EndpointKey) -> BTreeSet<String> {
        let mut tokens = self.tokenize(&key.endpoint);
        let method = key.method.to_ascii_lowercase();
        if !method.is_empty() && !self.stop_segments.contains(&method) {
            tokens.insert(method);
        }
        tokens
    }
}

/// Jaccard overlap of two token sets, 0.0 for a pair with an empty union.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}
