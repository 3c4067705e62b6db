//! Retention policy and eviction accounting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RetentionConfig;

/// Governs eviction. Applied by the pool store only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Records older than this are expired. 0 disables age eviction.
    pub max_age_days: u32,
    /// Hard cap on stored records; oldest evicted first. 0 disables the cap.
    pub max_records: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            max_records: 1_000_000,
        }
    }
}

impl RetentionPolicy {
    /// The oldest timestamp still inside the retention window, relative to
    /// `now`. `None` when age eviction is disabled.
    pub fn age_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.max_age_days == 0 {
            return None;
        }
        Some(now - Duration::days(i64::from(self.max_age_days)))
    }
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            max_age_days: config.max_age_days,
            max_records: config.max_records,
        }
    }
}

/// What one eviction pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionStats {
    pub evicted_by_age: usize,
    pub evicted_by_count: usize,
    pub remaining: usize,
}
