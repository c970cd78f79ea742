//! Retention rules: how old a message must be to go, and whether it can still
//! be removed with a bulk delete.
//!
//! All checks take `now` explicitly so one sweep step compares against a
//! single instant.

use crate::domain::{DomainError, Message};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Discord refuses bulk deletes for messages older than 14 days.
pub const BULK_DELETE_MAX_AGE: Duration = Duration::from_millis(1000 * 60 * 60 * 24 * 14);

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// True iff `now - created_at > threshold`. A message exactly at the threshold is not old.
pub fn is_older_than(message: &Message, threshold: Duration, now: DateTime<Utc>) -> bool {
    let age_ms = i128::from((now - message.created_at).num_milliseconds());
    let threshold_ms = i128::try_from(threshold.as_millis()).unwrap_or(i128::MAX);
    age_ms > threshold_ms
}

/// Whether the message is still young enough for the bulk-delete endpoint.
pub fn is_bulk_deletable(message: &Message, now: DateTime<Utc>) -> bool {
    !is_older_than(message, BULK_DELETE_MAX_AGE, now)
}

/// Time-to-live for channel messages. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    ttl: Duration,
}

impl RetentionPolicy {
    pub fn new(ttl: Duration) -> Result<Self, DomainError> {
        if ttl.is_zero() {
            return Err(DomainError::InvalidRetention(format!("{} ms", ttl.as_millis())));
        }
        Ok(Self { ttl })
    }

    /// Build from a signed number of seconds, as read from the environment.
    pub fn from_secs(secs: i64) -> Result<Self, DomainError> {
        if secs <= 0 {
            return Err(DomainError::InvalidRetention(format!("{} s", secs)));
        }
        Self::new(Duration::from_secs(secs.unsigned_abs()))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn ttl_millis(&self) -> u128 {
        self.ttl.as_millis()
    }

    pub fn ttl_days(&self) -> f64 {
        self.ttl.as_millis() as f64 / MILLIS_PER_DAY
    }

    /// Whether the message has outlived this policy.
    pub fn is_expired(&self, message: &Message, now: DateTime<Utc>) -> bool {
        is_older_than(message, self.ttl, now)
    }
}

/// Input of one sweep. Rebuilt for every run; nothing persists between sweeps.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Channel names in configured order. Duplicates are kept.
    pub channel_names: Vec<String>,
    pub retention: RetentionPolicy,
    /// Preview (dry-run): read everything, delete nothing.
    pub preview: bool,
}

impl SweepConfig {
    pub fn new(channel_names: Vec<String>, retention: RetentionPolicy, preview: bool) -> Self {
        Self {
            channel_names,
            retention,
            preview,
        }
    }

    /// How many times a channel name appears in the configured list.
    pub fn occurrences(&self, name: &str) -> usize {
        self.channel_names.iter().filter(|n| n.as_str() == name).count()
    }
}
