//! Per-pod ingestion.
//!
//! One worker per tracked pod polls the log source on its own ticker and
//! feeds whatever it gets through the parser into the pool. A failed poll
//! keeps the cursor where it was, so the next tick re-fetches the same
//! window instead of losing lines.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::IngestionConfig;
use crate::ingestion::source::LogSource;
use crate::observability::metrics;
use crate::parser::LineParser;
use crate::pool::PoolStore;
use crate::resilience::{with_retries, RetryPlan};

/// Counts for one batch of submitted or polled lines.
///
/// `skipped` covers every line that did not become a record, whether the
/// parser rejected it or the store refused the append; each case is logged
/// with its reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub ingested: usize,
    pub skipped: usize,
}

/// Parse and append a batch of lines for one pod.
pub fn ingest_lines(
    parser: &LineParser,
    pool: &PoolStore,
    pod: &str,
    lines: &[String],
) -> IngestOutcome {
    let now = Utc::now();
    let mut outcome = IngestOutcome::default();
    for line in lines {
        match parser.parse(line, now) {
            Ok(event) => match pool.append(pod, event) {
                Ok(_) => outcome.ingested += 1,
                Err(error) => {
                    outcome.skipped += 1;
                    metrics::record_store_drop(pod);
                    tracing::warn!(pod, error = %error, "Record dropped: append failed");
                }
            },
            Err(reason) => {
                outcome.skipped += 1;
                metrics::record_parse_skip(pod);
                tracing::debug!(pod, reason = %reason, "Line skipped");
            }
        }
    }
    metrics::record_ingested(pod, outcome.ingested);
    outcome
}

/// Background poller for one pod.
pub struct PodWorker {
    pod: String,
    source: Arc<dyn LogSource>,
    parser: Arc<LineParser>,
    pool: Arc<PoolStore>,
    poll_interval: Duration,
    retry: RetryPlan,
}

impl PodWorker {
    pub fn new(
        pod: String,
        source: Arc<dyn LogSource>,
        parser: Arc<LineParser>,
        pool: Arc<PoolStore>,
        config: &IngestionConfig,
    ) -> Self {
        Self {
            pod,
            source,
            parser,
            pool,
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            retry: config.retry,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            pod = %self.pod,
            interval_secs = self.poll_interval.as_secs(),
            "Ingestion worker starting"
        );

        // First poll covers one interval back; afterwards the cursor rides
        // each successful poll's start time.
        let mut cursor = Utc::now()
            - chrono::Duration::seconds(self.poll_interval.as_secs().min(i64::MAX as u64) as i64);
        let mut ticker = time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cursor = self.poll(cursor).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(pod = %self.pod, "Ingestion worker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn poll(&self, since: DateTime<Utc>) -> DateTime<Utc> {
        let poll_started = Utc::now();
        let lines = match with_retries("log fetch", &self.retry, || {
            self.source.fetch_lines(&self.pod, since)
        })
        .await
        {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(pod = %self.pod, error = %error, "Log poll failed; cursor unchanged");
                metrics::record_poll(&self.pod, "failed");
                return since;
            }
        };

        let outcome = ingest_lines(&self.parser, &self.pool, &self.pod, &lines);
        metrics::record_poll(&self.pod, "ok");
        if !lines.is_empty() {
            tracing::debug!(
                pod = %self.pod,
                lines = lines.len(),
                ingested = outcome.ingested,
                skipped = outcome.skipped,
                "Poll complete"
            );
        }
        poll_started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParserConfig, PoolConfig};
    use crate::pool::RetentionPolicy;

    fn fixtures() -> (LineParser, PoolStore) {
        let parser = LineParser::from_config(&ParserConfig::default());
        let pool = PoolStore::new(&PoolConfig::default(), RetentionPolicy::default())
            .expect("in-memory pool");
        (parser, pool)
    }

    #[test]
    fn test_ingest_counts_parsed_and_skipped() {
        let (parser, pool) = fixtures();
        let lines = vec![
            "GET /items/123 200 10ms ip=10.0.0.5".to_string(),
            "not a log line at all %%%".to_string(),
            "POST /orders 201 25ms".to_string(),
        ];

        let outcome = ingest_lines(&parser, &pool, "pod-a", &lines);
        assert_eq!(outcome, IngestOutcome { ingested: 2, skipped: 1 });
        assert_eq!(pool.record_count(), 2);
    }

    #[test]
    fn test_ingest_empty_batch() {
        let (parser, pool) = fixtures();
        let outcome = ingest_lines(&parser, &pool, "pod-a", &[]);
        assert_eq!(outcome, IngestOutcome::default());
    }
}
