//! Retention pruning of recorded attempts, throttled per process.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Minimum wall-clock spacing between two prunes.
pub const PRUNE_INTERVAL_SECS: i64 = 3600;

/// Whether a prune may run at `now` given the previous run at `last`.
#[must_use]
pub fn prune_due(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> bool {
    last.is_none_or(|last| now - last >= Duration::seconds(PRUNE_INTERVAL_SECS))
}

/// Creation-time cutoff for a retention window of `retention_days`.
/// `None` when retention is disabled (zero days).
#[must_use]
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> Option<DateTime<Utc>> {
    (retention_days > 0).then(|| now - Duration::days(i64::from(retention_days)))
}

/// Process-wide record of the last prune. Starts out as "never pruned".
#[derive(Debug, Default)]
pub struct PruneThrottle {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl PruneThrottle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next prune slot. Returns `true` and stamps `now` when a
    /// prune is due, `false` otherwise.
    pub fn try_claim(&self, now: DateTime<Utc>) -> bool {
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if prune_due(now, *last) {
            *last = Some(now);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn last_pruned(&self) -> Option<DateTime<Utc>> {
        *self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
