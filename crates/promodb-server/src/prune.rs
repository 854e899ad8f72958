//! Throttled retention prune shared by the events handler and the scheduler.

use chrono::{DateTime, Utc};
use promodb_ranking::{retention_cutoff, PruneThrottle};
use sqlx::PgPool;

/// Delete attempts older than the retention window, at most once per
/// throttle interval. Returns the number of rows removed when a prune ran.
///
/// Failures are logged and swallowed; the throttle slot stays claimed so a
/// failing database is not hammered on every event.
pub async fn run_prune(
    pool: &PgPool,
    throttle: &PruneThrottle,
    retention_days: u32,
    now: DateTime<Utc>,
) -> Option<u64> {
    let cutoff = retention_cutoff(now, retention_days)?;
    if !throttle.try_claim(now) {
        return None;
    }

    match promodb_db::delete_attempts_before(pool, cutoff).await {
        Ok(removed) => {
            tracing::info!(removed, cutoff = %cutoff, "pruned expired code attempts");
            Some(removed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "attempt prune failed");
            None
        }
    }
}
