//! Per-code success signals derived from recorded attempts.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use promodb_core::{normalize_domain, AttemptRecord};
use serde::Serialize;

/// Rolling window, in days, used when ranking.
pub const SIGNAL_WINDOW_DAYS: i64 = 90;

/// Aggregated outcome signals for one code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeSignals {
    /// Attempts counted.
    pub n: u32,
    /// Attempts that succeeded or saved money.
    pub ok: u32,
    /// Running mean of the amount saved over the `n` attempts.
    pub avg_saved: f64,
    /// Timestamp of the newest counted attempt.
    pub last: Option<DateTime<Utc>>,
}

impl CodeSignals {
    fn observe(&mut self, record: &AttemptRecord) {
        let saved = record.saved.unwrap_or(0.0);
        self.n += 1;
        if record.success || saved > 0.0 {
            self.ok += 1;
        }
        let n = f64::from(self.n);
        self.avg_saved = (self.avg_saved * (n - 1.0) + saved) / n;
        self.last = Some(self.last.map_or(record.created_at, |l| l.max(record.created_at)));
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            f64::from(self.ok) / f64::from(self.n)
        }
    }
}

/// Aggregate `records` for `domain` created within `window_days` of `now`.
///
/// Records for other domains or outside the window are ignored. An empty
/// domain yields an empty map.
#[must_use]
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a AttemptRecord>,
    domain: &str,
    window_days: i64,
    now: DateTime<Utc>,
) -> HashMap<String, CodeSignals> {
    let domain = normalize_domain(domain);
    let mut stats: HashMap<String, CodeSignals> = HashMap::new();
    if domain.is_empty() {
        return stats;
    }

    let cutoff = now - Duration::days(window_days);
    for record in records {
        if record.created_at < cutoff || normalize_domain(&record.domain) != domain {
            continue;
        }
        stats.entry(record.code.clone()).or_default().observe(record);
    }
    stats
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    fn attempt(code: &str, success: bool, saved: Option<f64>, days_ago: i64) -> AttemptRecord {
        AttemptRecord {
            domain: "example.com".to_string(),
            code: code.to_string(),
            success,
            saved,
            created_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn avg_saved_is_exact_running_mean() {
        let records = vec![
            attempt("SAVE10", false, Some(10.0), 3),
            attempt("SAVE10", false, Some(0.0), 2),
            attempt("SAVE10", false, Some(20.0), 1),
        ];
        let stats = aggregate(&records, "example.com", SIGNAL_WINDOW_DAYS, now());
        let s = &stats["SAVE10"];
        assert_eq!(s.n, 3);
        assert!((s.avg_saved - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ok_counts_success_or_positive_saving() {
        let records = vec![
            attempt("A1B2C", true, None, 5),
            attempt("A1B2C", false, Some(3.5), 4),
            attempt("A1B2C", false, Some(0.0), 3),
            attempt("A1B2C", false, None, 2),
        ];
        let stats = aggregate(&records, "example.com", SIGNAL_WINDOW_DAYS, now());
        let s = &stats["A1B2C"];
        assert_eq!(s.n, 4);
        assert_eq!(s.ok, 2);
        assert!((s.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_saved_counts_as_zero() {
        let records = vec![attempt("X", true, None, 1), attempt("X", true, Some(8.0), 1)];
        let stats = aggregate(&records, "example.com", SIGNAL_WINDOW_DAYS, now());
        assert!((stats["X"].avg_saved - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn last_is_newest_timestamp() {
        let records = vec![
            attempt("X", true, None, 1),
            attempt("X", false, None, 10),
        ];
        let stats = aggregate(&records, "example.com", SIGNAL_WINDOW_DAYS, now());
        assert_eq!(stats["X"].last, Some(now() - Duration::days(1)));
    }

    #[test]
    fn records_outside_window_are_ignored() {
        let records = vec![attempt("OLD", true, Some(5.0), 91), attempt("NEW", true, None, 89)];
        let stats = aggregate(&records, "example.com", SIGNAL_WINDOW_DAYS, now());
        assert!(!stats.contains_key("OLD"));
        assert!(stats.contains_key("NEW"));
    }

    #[test]
    fn other_domains_are_ignored() {
        let mut other = attempt("X", true, None, 1);
        other.domain = "other.test".to_string();
        let stats = aggregate(&[other], "example.com", SIGNAL_WINDOW_DAYS, now());
        assert!(stats.is_empty());
    }

    #[test]
    fn domain_is_normalized_before_matching() {
        let records = vec![attempt("X", true, None, 1)];
        let stats = aggregate(&records, "https://www.Example.com", SIGNAL_WINDOW_DAYS, now());
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn empty_domain_yields_empty_map() {
        let records = vec![attempt("X", true, None, 1)];
        assert!(aggregate(&records, "", SIGNAL_WINDOW_DAYS, now()).is_empty());
    }
}
