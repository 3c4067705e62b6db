//! Line-format matchers.
//!
//! # Responsibilities
//! - Recognize one wire format per matcher
//! - Extract method, path, and whatever else the format carries
//! - Leave fallback policy (timestamps, skip counting) to the parser
//!
//! # Design Decisions
//! - First matching format wins; order comes from configuration
//! - A matcher that does not recognize a line returns None, never an error
//! - Timestamps parse leniently: a malformed one is treated as absent

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use regex::Regex;

/// Fields a matcher recovered from one line.
///
/// Only method and path are guaranteed; everything else depends on the
/// format.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedLine {
    pub method: String,
    pub path: String,
    pub status_code: Option<u16>,
    pub client_ip: Option<IpAddr>,
    pub latency_ms: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Trait for recognizing one log line format.
pub trait LineMatcher: Send + Sync + std::fmt::Debug {
    /// Stable name used in configuration and format hints.
    fn name(&self) -> &str;

    /// Returns the extracted fields if the line is in this format.
    fn try_match(&self, line: &str) -> Option<MatchedLine>;
}

/// Combined/common access-log format:
/// `10.0.0.5 - frank [10/Oct/2000:13:55:36 -0700] "GET /items/1 HTTP/1.0" 200 2326`
#[derive(Debug)]
pub struct CombinedLogMatcher {
    pattern: Regex,
}

impl CombinedLogMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r#"^(\S+) \S+ \S+ \[([^\]]+)\] "(\S+) (\S+)(?: [^"]*)?" (\d{3}) \S+"#,
            )
            .expect("combined log pattern is valid"),
        }
    }
}

impl Default for CombinedLogMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for CombinedLogMatcher {
    fn name(&self) -> &str {
        "combined"
    }

    fn try_match(&self, line: &str) -> Option<MatchedLine> {
        let caps = self.pattern.captures(line)?;
        Some(MatchedLine {
            method: caps[3].to_string(),
            path: caps[4].to_string(),
            status_code: caps[5].parse().ok(),
            client_ip: caps[1].parse().ok(),
            latency_ms: None,
            timestamp: parse_clf_timestamp(&caps[2]),
        })
    }
}

/// Structured JSON lines, either flat or with a nested `request` object:
/// `{"request":{"method":"GET","path":"/items/1","status":200},...}`
#[derive(Debug, Default)]
pub struct JsonLogMatcher;

impl LineMatcher for JsonLogMatcher {
    fn name(&self) -> &str {
        "json"
    }

    fn try_match(&self, line: &str) -> Option<MatchedLine> {
        let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
        let root = value.as_object()?;
        let request = root
            .get("request")
            .and_then(|r| r.as_object())
            .unwrap_or(root);

        let method = request.get("method")?.as_str()?.to_string();
        let path = first_str(request, &["path", "uri", "url"])?.to_string();

        let status_code = first_u64(request, &["status", "status_code"])
            .and_then(|s| u16::try_from(s).ok());
        let client_ip = first_str(request, &["client_ip", "remote_addr", "ip"])
            .and_then(|s| s.parse().ok());
        let latency_ms = first_u64(request, &["latency_ms", "duration_ms"]);
        // Timestamps commonly sit at the envelope level, not inside `request`
        let timestamp = first_str(root, &["timestamp", "time", "@timestamp"])
            .or_else(|| first_str(request, &["timestamp", "time"]))
            .and_then(parse_rfc3339);

        Some(MatchedLine {
            method,
            path,
            status_code,
            client_ip,
            latency_ms,
            timestamp,
        })
    }
}

/// Terse single-line app format: `GET /items/123 200 10ms ip=10.0.0.5`
#[derive(Debug)]
pub struct PlainLogMatcher {
    pattern: Regex,
}

impl PlainLogMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^([A-Za-z]+) (/\S*) (\d{3})(?: (\d+)ms)?(?: ip=(\S+))?\s*$")
                .expect("plain log pattern is valid"),
        }
    }
}

impl Default for PlainLogMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for PlainLogMatcher {
    fn name(&self) -> &str {
        "plain"
    }

    fn try_match(&self, line: &str) -> Option<MatchedLine> {
        let caps = self.pattern.captures(line)?;
        Some(MatchedLine {
            method: caps[1].to_string(),
            path: caps[2].to_string(),
            status_code: caps[3].parse().ok(),
            client_ip: caps.get(5).and_then(|m| m.as_str().parse().ok()),
            latency_ms: caps.get(4).and_then(|m| m.as_str().parse().ok()),
            timestamp: None,
        })
    }
}

/// Deployment-specific format described by a configured regex with named
/// capture groups: `method` and `path` required; `status`, `ip`,
/// `latency_ms` and `timestamp` honored when present.
#[derive(Debug)]
pub struct CustomLogMatcher {
    name: String,
    pattern: Regex,
}

impl CustomLogMatcher {
    pub fn new(name: String, pattern: Regex) -> Self {
        Self { name, pattern }
    }
}

impl LineMatcher for CustomLogMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_match(&self, line: &str) -> Option<MatchedLine> {
        let caps = self.pattern.captures(line)?;
        let method = caps.name("method")?.as_str().to_string();
        let path = caps.name("path")?.as_str().to_string();
        Some(MatchedLine {
            method,
            path,
            status_code: caps.name("status").and_then(|m| m.as_str().parse().ok()),
            client_ip: caps.name("ip").and_then(|m| m.as_str().parse().ok()),
            latency_ms: caps.name("latency_ms").and_then(|m| m.as_str().parse().ok()),
            timestamp: caps
                .name("timestamp")
                .and_then(|m| parse_any_timestamp(m.as_str())),
        })
    }
}

fn first_str<'a>(
    obj: &'a serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
}

fn first_u64(obj: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(|v| v.as_u64()))
}

/// `10/Oct/2000:13:55:36 -0700`
fn parse_clf_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S %z")
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

fn parse_any_timestamp(s: &str) -> Option<DateTime<Utc>> {
    parse_rfc3339(s).or_else(|| parse_clf_timestamp(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_combined_matcher() {
        let m = CombinedLogMatcher::new();
        let line = r#"10.0.0.5 - frank [10/Oct/2000:13:55:36 -0700] "GET /items/1 HTTP/1.0" 200 2326"#;
        let matched = m.try_match(line).unwrap();
        assert_eq!(matched.method, "GET");
        assert_eq!(matched.path, "/items/1");
        assert_eq!(matched.status_code, Some(200));
        assert_eq!(matched.client_ip, Some("10.0.0.5".parse().unwrap()));
        assert_eq!(
            matched.timestamp,
            Some(Utc.with_ymd_and_hms(2000, 10, 10, 20, 55, 36).unwrap())
        );
    }

    #[test]
    fn test_combined_matcher_rejects_garbage() {
        let m = CombinedLogMatcher::new();
        assert!(m.try_match("not an access log").is_none());
    }

    #[test]
    fn test_json_matcher_nested_request() {
        let m = JsonLogMatcher;
        let line = r#"{"timestamp":"2024-05-01T10:00:00Z","request":{"method":"POST","path":"/orders","status":201,"latency_ms":42,"client_ip":"10.1.2.3"}}"#;
        let matched = m.try_match(line).unwrap();
        assert_eq!(matched.method, "POST");
        assert_eq!(matched.path, "/orders");
        assert_eq!(matched.status_code, Some(201));
        assert_eq!(matched.latency_ms, Some(42));
        assert_eq!(matched.client_ip, Some("10.1.2.3".parse().unwrap()));
        assert!(matched.timestamp.is_some());
    }

    #[test]
    fn test_json_matcher_flat_object() {
        let m = JsonLogMatcher;
        let line = r#"{"method":"GET","uri":"/health","status":200}"#;
        let matched = m.try_match(line).unwrap();
        assert_eq!(matched.path, "/health");
    }

    #[test]
    fn test_json_matcher_requires_method_and_path() {
        let m = JsonLogMatcher;
        assert!(m.try_match(r#"{"level":"info","msg":"started"}"#).is_none());
    }

    #[test]
    fn test_plain_matcher() {
        let m = PlainLogMatcher::new();
        let matched = m.try_match("GET /items/123 200 10ms ip=10.0.0.5").unwrap();
        assert_eq!(matched.method, "GET");
        assert_eq!(matched.path, "/items/123");
        assert_eq!(matched.status_code, Some(200));
        assert_eq!(matched.latency_ms, Some(10));
        assert_eq!(matched.client_ip, Some("10.0.0.5".parse().unwrap()));

        // Latency and ip are optional
        let matched = m.try_match("DELETE /items/123 204").unwrap();
        assert_eq!(matched.latency_ms, None);
        assert_eq!(matched.client_ip, None);
    }

    #[test]
    fn test_custom_matcher_named_groups() {
        let m = CustomLogMatcher::new(
            "legacy".into(),
            Regex::new(r"^\[(?P<timestamp>[^\]]+)\] (?P<method>\S+) (?P<path>\S+) -> (?P<status>\d+)$")
                .unwrap(),
        );
        let matched = m
            .try_match("[2024-05-01T10:00:00Z] GET /legacy/7 -> 200")
            .unwrap();
        assert_eq!(matched.method, "GET");
        assert_eq!(matched.path, "/legacy/7");
        assert_eq!(matched.status_code, Some(200));
        assert!(matched.timestamp.is_some());
    }

    #[test]
    fn test_malformed_timestamp_treated_absent() {
        let m = CombinedLogMatcher::new();
        let line = r#"10.0.0.5 - - [garbage] "GET /items/1 HTTP/1.0" 200 17"#;
        let matched = m.try_match(line).unwrap();
        assert_eq!(matched.timestamp, None);
    }
}
