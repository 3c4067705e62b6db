//! The pool store: bounded, queryable retention for call records.
//!
//! # Responsibilities
//! - Append-only storage surviving the platform's short log window
//! - Snapshot-consistent range queries while ingestion continues
//! - Scheduled eviction under the retention policy
//!
//! # Locking Discipline
//! ```text
//! write lane (one Mutex)          readers
//!   appends                         load sealed segments (ArcSwap, lock-free)
//!   segment sealing                 copy active tail (brief lane lock,
//!   eviction + file rewrite           bounded by segment_capacity)
//!                                   iterate owned snapshot, no locks held
//! ```
//! Sealed segments are immutable behind `Arc`; eviction publishes rebuilt
//! segment lists instead of mutating, so a reader holding an older snapshot
//! keeps a coherent view for as long as it iterates.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PoolConfig;
use crate::model::{CallEvent, CallRecord};
use crate::pool::persist::{self, LineAppender};
use crate::pool::retention::{EvictionStats, RetentionPolicy};

/// Errors from pool operations.
///
/// Unavailability is fatal to the single operation that hit it, never to the
/// ingestion loop; callers retry or drop the one record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pool storage unavailable: {0}")]
    Unavailable(String),

    #[error("rejected record: {0}")]
    InvalidRecord(String),
}

/// Inclusive time window for queries and analysis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts <= self.to
    }
}

/// Optional record filters applied by `PoolStore::query`.
///
/// The endpoint prefix compares case-insensitively, matching `EndpointKey`
/// equality; pod and method are exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub pod: Option<String>,
    pub method: Option<String>,
    pub endpoint_prefix: Option<String>,
}

impl QueryFilter {
    fn matches(&self, record: &CallRecord) -> bool {
        if let Some(pod) = &self.pod {
            if record.source_pod != *pod {
                return false;
            }
        }
        if let Some(method) = &self.method {
            if record.method != *method {
                return false;
            }
        }
        if let Some(prefix) = &self.endpoint_prefix {
            if !record
                .normalized_endpoint
                .to_lowercase()
                .starts_with(&prefix.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Operational snapshot for the status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    pub record_count: usize,
    pub sealed_segments: usize,
    pub policy: RetentionPolicy,
    pub last_eviction_at: Option<DateTime<Utc>>,
}

/// An immutable run of records, published once sealed.
#[derive(Debug)]
struct Segment {
    records: Vec<CallRecord>,
    min_ts: DateTime<Utc>,
    max_ts: DateTime<Utc>,
}

impl Segment {
    /// Seal a batch into an immutable segment. Empty batches seal to None.
    fn seal(records: Vec<CallRecord>) -> Option<Arc<Segment>> {
        let first = records.first()?.timestamp;
        let (min_ts, max_ts) = records.iter().skip(1).fold((first, first), |(lo, hi), r| {
            (lo.min(r.timestamp), hi.max(r.timestamp))
        });
        Some(Arc::new(Segment {
            records,
            min_ts,
            max_ts,
        }))
    }

    fn overlaps(&self, range: &TimeRange, cutoff: Option<DateTime<Utc>>) -> bool {
        let floor = match cutoff {
            Some(c) => range.from.max(c),
            None => range.from,
        };
        self.max_ts >= floor && self.min_ts <= range.to
    }
}

type SegmentList = Vec<Arc<Segment>>;

/// Everything the single write lane guards.
#[derive(Debug)]
struct WriteLane {
    active: Vec<CallRecord>,
    /// Next sequence number per pod.
    sequences: HashMap<String, u64>,
    appender: Option<LineAppender>,
}

#[derive(Debug)]
struct PoolMeta {
    policy: RetentionPolicy,
    last_eviction_at: Option<DateTime<Utc>>,
}

/// See the module docs for the locking discipline.
#[derive(Debug)]
pub struct PoolStore {
    sealed: ArcSwap<SegmentList>,
    write: Mutex<WriteLane>,
    meta: Mutex<PoolMeta>,
    record_count: AtomicUsize,
    segment_capacity: usize,
    persistence_path: Option<String>,
}

impl PoolStore {
    /// Open the store, replaying the backing file when one is configured.
    pub fn new(config: &PoolConfig, policy: RetentionPolicy) -> Result<Self, StoreError> {
        let segment_capacity = config.segment_capacity.max(1);

        let (records, appender) = match &config.persistence_path {
            Some(path) => {
                let path = Path::new(path);
                let outcome = persist::replay(path)
                    .map_err(|e| StoreError::Unavailable(format!("replay failed: {e}")))?;
                if outcome.skipped_lines > 0 {
                    tracing::warn!(
                        skipped = outcome.skipped_lines,
                        "Pool replay skipped unreadable records"
                    );
                }
                let appender = LineAppender::open(path)
                    .map_err(|e| StoreError::Unavailable(format!("open failed: {e}")))?;
                (outcome.records, Some(appender))
            }
            None => (Vec::new(), None),
        };

        let mut sequences: HashMap<String, u64> = HashMap::new();
        for record in &records {
            let next = sequences.entry(record.source_pod.clone()).or_insert(0);
            *next = (*next).max(record.sequence + 1);
        }

        let record_count = records.len();
        let mut sealed: SegmentList = Vec::new();
        let mut active: Vec<CallRecord> = Vec::new();
        let mut iter = records.into_iter().peekable();
        let mut batch = Vec::with_capacity(segment_capacity);
        while let Some(record) = iter.next() {
            batch.push(record);
            if batch.len() == segment_capacity && iter.peek().is_some() {
                if let Some(segment) = Segment::seal(std::mem::take(&mut batch)) {
                    sealed.push(segment);
                }
                batch = Vec::with_capacity(segment_capacity);
            }
        }
        if batch.len() == segment_capacity {
            if let Some(segment) = Segment::seal(batch) {
                sealed.push(segment);
            }
        } else {
            active = batch;
        }

        if record_count > 0 {
            tracing::info!(
                records = record_count,
                segments = sealed.len(),
                "Pool store replayed from disk"
            );
        }

        Ok(Self {
            sealed: ArcSwap::from_pointee(sealed),
            write: Mutex::new(WriteLane {
                active,
                sequences,
                appender,
            }),
            meta: Mutex::new(PoolMeta {
                policy,
                last_eviction_at: None,
            }),
            record_count: AtomicUsize::new(record_count),
            segment_capacity,
            persistence_path: config.persistence_path.clone(),
        })
    }

    /// Append one call, stamping the source pod and its next sequence.
    ///
    /// With persistence enabled, a file write failure fails this append and
    /// leaves the in-memory store untouched.
    pub fn append(&self, pod: &str, event: CallEvent) -> Result<CallRecord, StoreError> {
        if pod.is_empty() {
            return Err(StoreError::InvalidRecord("empty pod id".into()));
        }
        if event.normalized_endpoint.is_empty() {
            return Err(StoreError::InvalidRecord("empty normalized endpoint".into()));
        }

        let mut lane = self.write.lock().expect("pool write lane poisoned");
        let sequence = lane.sequences.get(pod).copied().unwrap_or(0);
        let record = CallRecord::from_event(event, pod, sequence);

        if let Some(appender) = lane.appender.as_mut() {
            appender
                .append(&record)
                .map_err(|e| StoreError::Unavailable(format!("append failed: {e}")))?;
        }

        lane.sequences.insert(pod.to_string(), sequence + 1);
        lane.active.push(record.clone());
        if lane.active.len() >= self.segment_capacity {
            self.seal_active(&mut lane);
        }
        // Count updates stay under the lane so eviction's rewrite of the
        // total cannot race a concurrent increment.
        self.record_count.fetch_add(1, Ordering::Relaxed);
        drop(lane);

        Ok(record)
    }

    /// Query records in `range`, newest snapshot first assembled, then
    /// iterated without holding any lock.
    ///
    /// The retention age cutoff is applied as of query issue: a record
    /// already past the cutoff is invisible even if eviction has not
    /// physically removed it yet.
    pub fn query(&self, range: TimeRange, filter: QueryFilter) -> PoolQuery {
        let cutoff = {
            let meta = self.meta.lock().expect("pool meta poisoned");
            meta.policy.age_cutoff(Utc::now())
        };

        // Lane lock pins the sealed list: sealing and eviction both happen
        // under it, so sealed + tail form one consistent snapshot.
        let lane = self.write.lock().expect("pool write lane poisoned");
        let sealed = self.sealed.load_full();
        let tail = lane.active.clone();
        drop(lane);

        let segments: Vec<Arc<Segment>> = sealed
            .iter()
            .filter(|s| s.overlaps(&range, cutoff))
            .cloned()
            .collect();

        PoolQuery {
            segments,
            tail,
            seg_idx: 0,
            rec_idx: 0,
            range,
            cutoff,
            filter,
        }
    }

    /// Evict expired and over-cap records.
    ///
    /// Serialized with appends on the write lane; readers keep whatever
    /// snapshot they already hold. The age pass removes only records older
    /// than the cutoff; the count pass then trims oldest-first down to
    /// `max_records`, which under sustained overload can remove records the
    /// age pass would have kept. That pressure is logged.
    pub fn evict(&self, policy: &RetentionPolicy) -> EvictionStats {
        let mut lane = self.write.lock().expect("pool write lane poisoned");
        let now = Utc::now();
        let cutoff = policy.age_cutoff(now);
        let sealed = self.sealed.load_full();

        let mut evicted_by_age = 0usize;
        let mut batches: Vec<Vec<CallRecord>> = Vec::with_capacity(sealed.len() + 1);
        for segment in sealed.iter() {
            let kept = match cutoff {
                Some(c) if segment.min_ts < c => {
                    let before = segment.records.len();
                    let kept: Vec<CallRecord> = segment
                        .records
                        .iter()
                        .filter(|r| r.timestamp >= c)
                        .cloned()
                        .collect();
                    evicted_by_age += before - kept.len();
                    kept
                }
                _ => segment.records.clone(),
            };
            batches.push(kept);
        }
        let mut active = std::mem::take(&mut lane.active);
        if let Some(c) = cutoff {
            let before = active.len();
            active.retain(|r| r.timestamp >= c);
            evicted_by_age += before - active.len();
        }

        // Count pass: oldest-first means front batches, then front of the
        // active tail.
        let total: usize = batches.iter().map(Vec::len).sum::<usize>() + active.len();
        let mut evicted_by_count = 0usize;
        let mut pressure_evicted = 0usize;
        if policy.max_records > 0 && total > policy.max_records {
            let mut excess = total - policy.max_records;
            for batch in batches.iter_mut() {
                if excess == 0 {
                    break;
                }
                let take = excess.min(batch.len());
                for dropped in batch.drain(..take) {
                    if cutoff.map_or(true, |c| dropped.timestamp >= c) {
                        pressure_evicted += 1;
                    }
                }
                evicted_by_count += take;
                excess -= take;
            }
            if excess > 0 {
                let take = excess.min(active.len());
                for dropped in active.drain(..take) {
                    if cutoff.map_or(true, |c| dropped.timestamp >= c) {
                        pressure_evicted += 1;
                    }
                }
                evicted_by_count += take;
            }
        }

        if pressure_evicted > 0 {
            tracing::warn!(
                records = pressure_evicted,
                max_records = policy.max_records,
                "Retention pressure: record cap evicted records younger than the age floor"
            );
        }

        let next_sealed: SegmentList = batches.into_iter().filter_map(Segment::seal).collect();
        let remaining: usize = next_sealed.iter().map(|s| s.records.len()).sum::<usize>() + active.len();
        if policy.max_records > 0 && remaining > policy.max_records {
            // Defensive retention check; never expected to fire.
            tracing::warn!(
                remaining,
                max_records = policy.max_records,
                "Retention violation: store still over cap after eviction"
            );
        }

        if let Some(path) = &self.persistence_path {
            let survivors = next_sealed
                .iter()
                .flat_map(|s| s.records.iter())
                .chain(active.iter());
            match persist::rewrite(Path::new(path), survivors) {
                Ok(appender) => lane.appender = Some(appender),
                Err(e) => {
                    tracing::error!(error = %e, "Pool compaction rewrite failed; keeping previous backing file");
                }
            }
        }

        self.sealed.store(Arc::new(next_sealed));
        lane.active = active;
        self.record_count.store(remaining, Ordering::Relaxed);
        drop(lane);

        {
            let mut meta = self.meta.lock().expect("pool meta poisoned");
            meta.policy = *policy;
            meta.last_eviction_at = Some(now);
        }

        let stats = EvictionStats {
            evicted_by_age,
            evicted_by_count,
            remaining,
        };
        if stats.evicted_by_age > 0 || stats.evicted_by_count > 0 {
            tracing::info!(
                by_age = stats.evicted_by_age,
                by_count = stats.evicted_by_count,
                remaining = stats.remaining,
                "Pool eviction pass complete"
            );
        }
        stats
    }

    /// Replace the retention policy (config reload path).
    pub fn set_policy(&self, policy: RetentionPolicy) {
        let mut meta = self.meta.lock().expect("pool meta poisoned");
        meta.policy = policy;
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.meta.lock().expect("pool meta poisoned").policy
    }

    pub fn record_count(&self) -> usize {
        self.record_count.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> PoolStatus {
        let meta = self.meta.lock().expect("pool meta poisoned");
        PoolStatus {
            record_count: self.record_count(),
            sealed_segments: self.sealed.load().len(),
            policy: meta.policy,
            last_eviction_at: meta.last_eviction_at,
        }
    }

    fn seal_active(&self, lane: &mut WriteLane) {
        if let Some(segment) = Segment::seal(std::mem::take(&mut lane.active)) {
            let current = self.sealed.load_full();
            let mut next = (*current).clone();
            next.push(segment);
            self.sealed.store(Arc::new(next));
        }
        lane.active = Vec::with_capacity(self.segment_capacity);
    }
}

/// Lazy cursor over one consistent snapshot of the pool.
///
/// Owns everything it iterates; dropping it mid-iteration (a cancelled
/// analysis) touches nothing in the store.
#[derive(Debug)]
pub struct PoolQuery {
    segments: Vec<Arc<Segment>>,
    tail: Vec<CallRecord>,
    seg_idx: usize,
    rec_idx: usize,
    range: TimeRange,
    cutoff: Option<DateTime<Utc>>,
    filter: QueryFilter,
}

impl PoolQuery {
    fn visible(&self, record: &CallRecord) -> bool {
        if !self.range.contains(record.timestamp) {
            return false;
        }
        if let Some(c) = self.cutoff {
            if record.timestamp < c {
                return false;
            }
        }
        self.filter.matches(record)
    }
}

impl Iterator for PoolQuery {
    type Item = CallRecord;

    fn next(&mut self) -> Option<CallRecord> {
        loop {
            let record = if self.seg_idx < self.segments.len() {
                let segment = &self.segments[self.seg_idx];
                match segment.records.get(self.rec_idx) {
                    Some(record) => {
                        self.rec_idx += 1;
                        record
                    }
                    None => {
                        self.seg_idx += 1;
                        self.rec_idx = 0;
                        continue;
                    }
                }
            } else {
                match self.tail.get(self.rec_idx) {
                    Some(record) => {
                        self.rec_idx += 1;
                        record
                    }
                    None => return None,
                }
            };

            if self.visible(record) {
                return Some(record.clone());
            }
        }
    }
}
