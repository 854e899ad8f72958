//! Outcome telemetry and ranking for promo codes.
//!
//! Aggregates recorded attempts into per-code signals, scores candidate codes
//! against those signals, and holds the rules for accepting new outcome
//! reports and pruning old ones.

pub mod attempt;
pub mod error;
pub mod prune;
pub mod scorer;
pub mod suggest;
pub mod telemetry;

pub use attempt::{
    compute_saved, hash_anon_id, prepare_attempt, round_currency, AttemptInput, NewAttempt,
    MAX_AMOUNT,
};
pub use error::TelemetryError;
pub use prune::{prune_due, retention_cutoff, PruneThrottle, PRUNE_INTERVAL_SECS};
pub use scorer::{rank_codes, score_code, RankReasons, RankedCode, SignalCounts};
pub use suggest::{merge_suggestions, DEFAULT_SUGGEST_LIMIT};
pub use telemetry::{aggregate, CodeSignals, SIGNAL_WINDOW_DAYS};
