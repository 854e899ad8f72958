//! Composite relevance score for candidate codes.
//!
//! The score is a fixed weighted sum of observed success, recency of the
//! last attempt, average saving, seed-list prior, and lexical shape:
//!
//! ```text
//! score = 0.45*success_rate + 0.2*recency_boost + 0.2*saved_boost
//!       + 0.1*prior + 0.05*shape
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use promodb_core::normalize_code;
use serde::Serialize;

use crate::telemetry::CodeSignals;

const RECENCY_HORIZON_SECS: f64 = 60.0 * 60.0 * 24.0 * 30.0;
const SAVED_SATURATION: f64 = 20.0;
const SEED_SATURATION: f64 = 5.0;
const MAX_CONFIDENCE: f64 = 0.98;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    pub trials: u32,
    pub recent_successes: u32,
}

/// Explanation of a code's score, plus the savings prediction derived from
/// the same signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankReasons {
    pub success_rate: f64,
    pub recency_boost: f64,
    pub saved_boost: f64,
    pub avg_saved: f64,
    pub prior: f64,
    pub shape: f64,
    pub velocity: f64,
    pub predicted_savings: f64,
    pub confidence: f64,
    pub best_for_total: u32,
    pub signals: SignalCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCode {
    pub code: String,
    pub score: f64,
    pub reasons: RankReasons,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Lexical plausibility of a code string.
#[must_use]
pub fn shape_score(code: &str) -> f64 {
    let mut shape = 0.0;
    if (5..=12).contains(&code.chars().count()) {
        shape += 0.2;
    }
    if code.chars().any(|c| c.is_ascii_digit()) {
        shape += 0.1;
    }
    if code.contains('-') {
        shape += 0.05;
    }
    shape
}

/// Linear decay from 1 at `now` to 0 thirty days after `last`. Timestamps
/// in the future count as "now".
#[must_use]
pub fn recency_boost(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last) = last else {
        return 0.0;
    };
    #[allow(clippy::cast_precision_loss)]
    let elapsed = (now - last).num_milliseconds().max(0) as f64 / 1000.0;
    (1.0 - (elapsed / RECENCY_HORIZON_SECS).min(1.0)).max(0.0)
}

/// Suggested minimum basket total for a predicted saving.
#[must_use]
pub fn best_for_total(predicted_savings: f64) -> u32 {
    if predicted_savings >= 25.0 {
        150
    } else if predicted_savings >= 15.0 {
        90
    } else if predicted_savings >= 10.0 {
        60
    } else if predicted_savings >= 5.0 {
        40
    } else {
        25
    }
}

/// Score a single normalized code.
#[must_use]
pub fn score_code(
    code: &str,
    signals: &CodeSignals,
    seed_count: u32,
    now: DateTime<Utc>,
) -> RankedCode {
    let success_rate = signals.success_rate();
    let recency_boost = recency_boost(signals.last, now);
    let avg_saved = signals.avg_saved;
    let saved_boost = (avg_saved / SAVED_SATURATION).clamp(0.0, 1.0);
    let prior = (f64::from(seed_count) / SEED_SATURATION).min(1.0);
    let shape = shape_score(code);

    let score = 0.45 * success_rate
        + 0.2 * recency_boost
        + 0.2 * saved_boost
        + 0.1 * prior
        + 0.05 * shape;

    let velocity = 0.6 * recency_boost + 0.4 * success_rate;
    let predicted_savings =
        (avg_saved * (0.55 + 0.45 * success_rate) + saved_boost * 8.0 + velocity * 3.0).max(0.0);
    let confidence =
        (0.35 + 0.4 * success_rate + 0.15 * recency_boost + 0.1 * prior).min(MAX_CONFIDENCE);

    RankedCode {
        code: code.to_string(),
        score,
        reasons: RankReasons {
            success_rate: round_to(success_rate, 3),
            recency_boost: round_to(recency_boost, 3),
            saved_boost: round_to(saved_boost, 3),
            avg_saved: round_to(avg_saved, 2),
            prior,
            shape,
            velocity: round_to(velocity, 3),
            predicted_savings: round_to(predicted_savings, 2),
            confidence: round_to(confidence, 3),
            best_for_total: best_for_total(predicted_savings),
            signals: SignalCounts {
                trials: signals.n,
                recent_successes: signals.ok,
            },
        },
    }
}

/// Rank `candidates` by composite score, highest first.
///
/// Candidates are trimmed and uppercased, and empty ones are dropped.
/// Duplicates are scored independently. Codes without telemetry get a
/// zero-signal score. Equal scores keep their input order.
#[must_use]
pub fn rank_codes<S: std::hash::BuildHasher, T: std::hash::BuildHasher>(
    candidates: &[String],
    stats: &HashMap<String, CodeSignals, S>,
    seed_counts: &HashMap<String, u32, T>,
    now: DateTime<Utc>,
) -> Vec<RankedCode> {
    let empty = CodeSignals::default();
    let mut ranked: Vec<RankedCode> = candidates
        .iter()
        .map(|c| normalize_code(c))
        .filter(|c| !c.is_empty())
        .map(|code| {
            let signals = stats.get(&code).unwrap_or(&empty);
            let seeds = seed_counts.get(&code).copied().unwrap_or(0);
            score_code(&code, signals, seeds, now)
        })
        .collect();

    // stable: ties keep input order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
