//! Log line parsing subsystem.
//!
//! # Data Flow
//! ```text
//! raw line (+ optional format hint)
//!     → matcher.rs (ordered format matchers, first match wins)
//!     → normalizer.rs (path to endpoint template)
//!     → CallEvent, ready for the pool store
//! ```
//!
//! # Design Decisions
//! - A line no matcher recognizes is a counted skip, never a batch failure
//! - Missing or malformed timestamps fall back to ingestion time
//! - Methods are canonicalized to upper case so aggregation does not split
//!   on log-source casing quirks

pub mod matcher;
pub mod normalizer;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::config::ParserConfig;
use crate::model::CallEvent;
use crate::parser::matcher::{
    CombinedLogMatcher, CustomLogMatcher, JsonLogMatcher, LineMatcher, MatchedLine,
    PlainLogMatcher,
};
use crate::parser::normalizer::EndpointNormalizer;

/// Why a single line was skipped. Counted by callers, never fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSkip {
    #[error("empty line")]
    EmptyLine,

    #[error("no configured format matched the line")]
    NoFormatMatched,

    #[error("unknown format hint: {0}")]
    UnknownFormatHint(String),
}

/// Format-agnostic line parser: an ordered list of matchers plus the
/// endpoint normalizer.
#[derive(Debug)]
pub struct LineParser {
    matchers: Vec<Box<dyn LineMatcher>>,
    normalizer: EndpointNormalizer,
}

impl LineParser {
    /// Build a parser from configuration.
    ///
    /// Format names and patterns are semantically validated at config load;
    /// anything invalid that still reaches here is skipped with a warning so
    /// ingestion can start with the formats that do work.
    pub fn from_config(config: &ParserConfig) -> Self {
        let mut matchers: Vec<Box<dyn LineMatcher>> = Vec::new();
        for name in &config.formats {
            match name.as_str() {
                "combined" => matchers.push(Box::new(CombinedLogMatcher::new())),
                "json" => matchers.push(Box::new(JsonLogMatcher)),
                "plain" => matchers.push(Box::new(PlainLogMatcher::new())),
                other => match config.custom_formats.iter().find(|c| c.name == other) {
                    Some(custom) => match Regex::new(&custom.pattern) {
                        Ok(pattern) => matchers
                            .push(Box::new(CustomLogMatcher::new(custom.name.clone(), pattern))),
                        Err(e) => {
                            tracing::warn!(format = %other, error = %e, "Skipping custom format with invalid pattern");
                        }
                    },
                    None => {
                        tracing::warn!(format = %other, "Skipping unknown line format");
                    }
                },
            }
        }

        let opaque = config
            .opaque_id_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Skipping invalid opaque-id pattern");
                    None
                }
            })
            .collect();

        Self {
            matchers,
            normalizer: EndpointNormalizer::new(opaque),
        }
    }

    /// Parse one raw line, trying matchers in configured order.
    pub fn parse(&self, line: &str, now: DateTime<Utc>) -> Result<CallEvent, ParseSkip> {
        self.parse_with_hint(line, None, now)
    }

    /// Parse one raw line against a single named format.
    pub fn parse_with_hint(
        &self,
        line: &str,
        hint: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CallEvent, ParseSkip> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(ParseSkip::EmptyLine);
        }

        let matched = match hint {
            Some(name) => {
                let matcher = self
                    .matchers
                    .iter()
                    .find(|m| m.name() == name)
                    .ok_or_else(|| ParseSkip::UnknownFormatHint(name.to_string()))?;
                matcher.try_match(trimmed).ok_or(ParseSkip::NoFormatMatched)?
            }
            None => self
                .matchers
                .iter()
                .find_map(|m| m.try_match(trimmed))
                .ok_or(ParseSkip::NoFormatMatched)?,
        };

        Ok(self.into_event(matched, now))
    }

    /// Normalize a path with this parser's endpoint normalizer.
    pub fn normalize(&self, path: &str) -> String {
        self.normalizer.normalize(path)
    }

    fn into_event(&self, matched: MatchedLine, now: DateTime<Utc>) -> CallEvent {
        let normalized_endpoint = self.normalizer.normalize(&matched.path);
        CallEvent {
            timestamp: matched.timestamp.unwrap_or(now),
            method: matched.method.to_ascii_uppercase(),
            raw_path: matched.path,
            normalized_endpoint,
            status_code: matched.status_code,
            client_ip: matched.client_ip,
            latency_ms: matched.latency_ms,
        }
    }
}
