//! Endpoint normalization.
//!
//! Collapses concrete request paths into path templates so that
//! `/items/123` and `/items/456` aggregate as one logical endpoint.
//!
//! # Design Decisions
//! - Deterministic and side-effect-free; identical inputs always normalize
//!   identically, which volume aggregation over days of pooled data relies on
//! - Numeric and UUID detection are plain char walks, no regex on this path
//! - Re-normalizing an already-normalized template is the identity

use regex::Regex;

/// Placeholder substituted for variable path segments.
pub const PLACEHOLDER: &str = "{id}";

/// Turns concrete paths into path templates.
#[derive(Debug, Default)]
pub struct EndpointNormalizer {
    /// Extra segment patterns treated as opaque ids, from configuration.
    opaque_patterns: Vec<Regex>,
}

impl EndpointNormalizer {
    pub fn new(opaque_patterns: Vec<Regex>) -> Self {
        Self { opaque_patterns }
    }

    /// Normalize a request path into its endpoint template.
    ///
    /// Query string and fragment are dropped, variable segments become
    /// `{id}`, and adjacent identical placeholders collapse into one. The
    /// result is never empty: a bare or unparseable path normalizes to `/`.
    pub fn normalize(&self, path: &str) -> String {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }
            let replaced = if self.is_variable(segment) {
                PLACEHOLDER
            } else {
                segment
            };
            // Collapse runs of identical placeholders
            if replaced == PLACEHOLDER && segments.last() == Some(&PLACEHOLDER) {
                continue;
            }
            segments.push(replaced);
        }

        if segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::with_capacity(path.len());
        for segment in segments {
            out.push('/');
            out.push_str(segment);
        }
        out
    }

    fn is_variable(&self, segment: &str) -> bool {
        if is_numeric(segment) || is_uuid_shaped(segment) {
            return true;
        }
        self.opaque_patterns.iter().any(|p| p.is_match(segment))
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// 8-4-4-4-12 hex groups, e.g. `550e8400-e29b-41d4-a716-446655440000`.
fn is_uuid_shaped(segment: &str) -> bool {
    if segment.len() != 36 {
        return false;
    }
    segment.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}
