//! API-call records and their aggregation identity.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed call before the pool store has stamped its storage identity.
///
/// Produced by the line parser; consumed by `PoolStore::append`, which adds
/// the source pod and a per-pod sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Request timestamp; ingestion time when the line carried none.
    pub timestamp: DateTime<Utc>,
    /// HTTP method, upper-cased as it appeared in the line.
    pub method: String,
    /// Path exactly as logged.
    pub raw_path: String,
    /// Path template produced by the normalizer. Never empty.
    pub normalized_endpoint: String,
    /// Response status, when the format carries one.
    pub status_code: Option<u16>,
    /// Client address, when the format carries one.
    pub client_ip: Option<IpAddr>,
    /// Request latency, when the format carries one.
    pub latency_ms: Option<u64>,
}

/// One stored API call. The unit of storage in the pool.
///
/// Immutable once created; the store never rewrites a record, eviction only
/// deletes whole records. Keyed by `(source_pod, timestamp, sequence)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub raw_path: String,
    pub normalized_endpoint: String,
    pub status_code: Option<u16>,
    pub client_ip: Option<IpAddr>,
    pub latency_ms: Option<u64>,
    /// Pod the line was collected from.
    pub source_pod: String,
    /// Per-pod, monotonically increasing append ordinal.
    pub sequence: u64,
}

impl CallRecord {
    /// Build a record from a parsed event plus the storage identity the
    /// pool store assigns.
    pub fn from_event(event: CallEvent, source_pod: &str, sequence: u64) -> Self {
        Self {
            timestamp: event.timestamp,
            method: event.method,
            raw_path: event.raw_path,
            normalized_endpoint: event.normalized_endpoint,
            status_code: event.status_code,
            client_ip: event.client_ip,
            latency_ms: event.latency_ms,
            source_pod: source_pod.to_string(),
            sequence,
        }
    }

    /// Aggregation identity for this record.
    pub fn endpoint_key(&self) -> EndpointKey {
        EndpointKey::new(&self.method, &self.normalized_endpoint)
    }
}

/// Identity used for all traffic aggregation.
///
/// Equality is case-sensitive on the method and case-insensitive on the
/// endpoint template: the template is lower-cased here, once, so the derived
/// `Eq`/`Hash`/`Ord` do the right thing and the same traffic always lands on
/// the same key across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointKey {
    pub method: String,
    pub endpoint: String,
}

impl EndpointKey {
    pub fn new(method: &str, endpoint: &str) -> Self {
        Self {
            method: method.to_string(),
            endpoint: endpoint.to_lowercase(),
        }
    }
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}
