//! Validation and normalisation of reported code outcomes before storage.

use promodb_core::{normalize_code, normalize_domain};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TelemetryError;

pub const MAX_USER_AGENT_CHARS: usize = 255;

/// Exclusive bound on stored currency amounts (`NUMERIC(12,2)`).
pub const MAX_AMOUNT: f64 = 1e10;

/// A raw outcome report as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttemptInput {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub saved: Option<f64>,
    #[serde(default)]
    pub before_total: Option<f64>,
    #[serde(default)]
    pub after_total: Option<f64>,
    #[serde(default)]
    pub anon_id: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub opt_out: bool,
}

/// A normalised attempt ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAttempt {
    pub domain: String,
    pub code: String,
    pub success: bool,
    pub saved: f64,
    pub before_total: Option<f64>,
    pub after_total: Option<f64>,
    /// Lowercase hex SHA-256 of the trimmed anonymous id.
    pub anon_id_hash: Option<String>,
    pub user_agent: Option<String>,
}

#[must_use]
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[must_use]
pub fn hash_anon_id(anon_id: &str) -> String {
    format!("{:x}", Sha256::digest(anon_id.trim().as_bytes()))
}

/// Amount saved: the explicit figure when given, otherwise the positive
/// difference of the two totals, otherwise zero.
#[must_use]
pub fn compute_saved(before_total: Option<f64>, after_total: Option<f64>, saved: Option<f64>) -> f64 {
    if let Some(explicit) = saved {
        return round_currency(explicit);
    }
    match (before_total, after_total) {
        (Some(before), Some(after)) => {
            round_currency((round_currency(before) - round_currency(after)).max(0.0))
        }
        _ => 0.0,
    }
}

/// Round a client-supplied amount, rejecting values storage cannot hold
/// and negative ones.
fn checked_amount(field: &'static str, value: Option<f64>) -> Result<Option<f64>, TelemetryError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let rounded = round_currency(value);
    if !rounded.is_finite() || rounded.abs() >= MAX_AMOUNT {
        return Err(TelemetryError::AmountOutOfRange(field));
    }
    if rounded < 0.0 {
        return Err(TelemetryError::NegativeAmount(field));
    }
    Ok(Some(rounded))
}

/// Validate and normalise `input`. Returns `Ok(None)` when the client opted
/// out, in which case nothing may be stored.
///
/// # Errors
///
/// Returns [`TelemetryError::MissingDomain`] or [`TelemetryError::MissingCode`]
/// when either is empty after normalisation, and
/// [`TelemetryError::NegativeAmount`] or [`TelemetryError::AmountOutOfRange`]
/// when `saved`, `before_total` or `after_total` cannot be stored.
pub fn prepare_attempt(input: &AttemptInput) -> Result<Option<NewAttempt>, TelemetryError> {
    if input.opt_out {
        return Ok(None);
    }

    let domain = normalize_domain(&input.domain);
    if domain.is_empty() {
        return Err(TelemetryError::MissingDomain);
    }
    let code = normalize_code(&input.code);
    if code.is_empty() {
        return Err(TelemetryError::MissingCode);
    }

    let saved = checked_amount("saved", input.saved)?;
    let before_total = checked_amount("before_total", input.before_total)?;
    let after_total = checked_amount("after_total", input.after_total)?;

    let anon_id_hash = input
        .anon_id
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(hash_anon_id);

    let user_agent = input
        .user_agent
        .as_deref()
        .filter(|ua| !ua.is_empty())
        .map(|ua| ua.chars().take(MAX_USER_AGENT_CHARS).collect());

    Ok(Some(NewAttempt {
        domain,
        code,
        success: input.success,
        saved: compute_saved(before_total, after_total, saved),
        before_total,
        after_total,
        anon_id_hash,
        user_agent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(domain: &str, code: &str) -> AttemptInput {
        AttemptInput {
            domain: domain.to_string(),
            code: code.to_string(),
            success: true,
            ..AttemptInput::default()
        }
    }

    #[test]
    fn opt_out_stores_nothing() {
        let mut i = input("shop.test", "SAVE10");
        i.opt_out = true;
        assert_eq!(prepare_attempt(&i), Ok(None));
    }

    #[test]
    fn empty_domain_is_rejected() {
        assert_eq!(
            prepare_attempt(&input(" https://www. ", "SAVE10")),
            Err(TelemetryError::MissingDomain)
        );
    }

    #[test]
    fn empty_code_is_rejected() {
        assert_eq!(
            prepare_attempt(&input("shop.test", "   ")),
            Err(TelemetryError::MissingCode)
        );
    }

    #[test]
    fn domain_and_code_are_normalized() {
        let a = prepare_attempt(&input("https://www.Shop.Test/cart", " save10 "))
            .unwrap()
            .unwrap();
        assert_eq!(a.domain, "shop.test");
        assert_eq!(a.code, "SAVE10");
    }

    #[test]
    fn saved_prefers_explicit_value() {
        assert!((compute_saved(Some(100.0), Some(80.0), Some(5.556)) - 5.56).abs() < 1e-9);
    }

    #[test]
    fn saved_falls_back_to_total_difference() {
        assert!((compute_saved(Some(100.0), Some(82.5), None) - 17.5).abs() < 1e-9);
        assert!((compute_saved(Some(50.0), Some(60.0), None)).abs() < 1e-9);
    }

    #[test]
    fn saved_defaults_to_zero() {
        assert!(compute_saved(Some(100.0), None, None).abs() < f64::EPSILON);
        assert!(compute_saved(None, None, None).abs() < f64::EPSILON);
    }

    #[test]
    fn anon_id_is_hashed() {
        let mut i = input("shop.test", "SAVE10");
        i.anon_id = Some("  user-123 ".to_string());
        let a = prepare_attempt(&i).unwrap().unwrap();
        let hash = a.anon_id_hash.unwrap();
        assert_eq!(hash, hash_anon_id("user-123"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn known_sha256_digest() {
        assert_eq!(
            hash_anon_id("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn user_agent_is_truncated() {
        let mut i = input("shop.test", "SAVE10");
        i.user_agent = Some("x".repeat(400));
        let a = prepare_attempt(&i).unwrap().unwrap();
        assert_eq!(a.user_agent.unwrap().len(), MAX_USER_AGENT_CHARS);
    }

    #[test]
    fn totals_are_rounded() {
        let mut i = input("shop.test", "SAVE10");
        i.before_total = Some(10.004);
        i.after_total = Some(7.499);
        let a = prepare_attempt(&i).unwrap().unwrap();
        assert_eq!(a.before_total, Some(10.0));
        assert_eq!(a.after_total, Some(7.5));
        assert!((a.saved - 2.5).abs() < 1e-9);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut i = input("shop.test", "SAVE10");
        i.saved = Some(-100.0);
        assert_eq!(
            prepare_attempt(&i),
            Err(TelemetryError::NegativeAmount("saved"))
        );

        let mut i = input("shop.test", "SAVE10");
        i.before_total = Some(-1.0);
        i.after_total = Some(5.0);
        assert_eq!(
            prepare_attempt(&i),
            Err(TelemetryError::NegativeAmount("before_total"))
        );
    }

    #[test]
    fn tiny_negative_rounding_to_zero_is_accepted() {
        let mut i = input("shop.test", "SAVE10");
        i.saved = Some(-0.001);
        let a = prepare_attempt(&i).unwrap().unwrap();
        assert!(a.saved.abs() < f64::EPSILON);
    }

    #[test]
    fn amounts_beyond_storage_are_rejected() {
        let mut i = input("shop.test", "SAVE10");
        i.saved = Some(1e12);
        assert_eq!(
            prepare_attempt(&i),
            Err(TelemetryError::AmountOutOfRange("saved"))
        );

        let mut i = input("shop.test", "SAVE10");
        i.after_total = Some(f64::INFINITY);
        assert_eq!(
            prepare_attempt(&i),
            Err(TelemetryError::AmountOutOfRange("after_total"))
        );

        let mut i = input("shop.test", "SAVE10");
        i.before_total = Some(9_999_999_999.99);
        assert!(prepare_attempt(&i).unwrap().is_some());
    }
}
