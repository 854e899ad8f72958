//! `rank` command: score candidate codes against stored telemetry.

use chrono::{Duration, Utc};
use promodb_core::AppConfig;
use promodb_ranking::{aggregate, rank_codes, RankedCode, SIGNAL_WINDOW_DAYS};

use crate::codes::check_allowlist;

/// Rank `codes` for `domain` and print one row per code, best first.
///
/// # Errors
///
/// Returns an error if the domain is not allowed or a query fails.
pub(crate) async fn run_rank(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    domain: &str,
    codes: &[String],
) -> anyhow::Result<()> {
    let domain = check_allowlist(config, domain)?;

    let now = Utc::now();
    let records =
        promodb_db::list_attempt_records(pool, &domain, now - Duration::days(SIGNAL_WINDOW_DAYS))
            .await?;
    let seeds = promodb_db::seed_counts(pool, &domain).await?;

    let stats = aggregate(&records, &domain, SIGNAL_WINDOW_DAYS, now);
    let ranked = rank_codes(codes, &stats, &seeds, now);

    if ranked.is_empty() {
        println!("no codes to rank");
        return Ok(());
    }

    println!("{}", header());
    for code in &ranked {
        println!("{}", format_row(code));
    }
    Ok(())
}

fn header() -> String {
    format!(
        "{:<16}{:>8}{:>8}{:>12}{:>10}{:>8}",
        "CODE", "SCORE", "CONF", "PREDICTED", "BEST_FOR", "TRIALS"
    )
}

fn format_row(code: &RankedCode) -> String {
    format!(
        "{:<16}{:>8.4}{:>8.3}{:>12.2}{:>10}{:>8}",
        code.code,
        code.score,
        code.reasons.confidence,
        code.reasons.predicted_savings,
        code.reasons.best_for_total,
        code.reasons.signals.trials
    )
}
