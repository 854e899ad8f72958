//! `export` command: dump recorded attempts as training rows.

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use promodb_db::AttemptRow;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// A single pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

/// One attempt as exported for offline analysis. The anonymous id and user
/// agent are never exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TrainingRow {
    pub id: i64,
    pub domain: String,
    pub code: String,
    pub success: bool,
    pub saved: f64,
    pub before_total: Option<f64>,
    pub after_total: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<&AttemptRow> for TrainingRow {
    fn from(row: &AttemptRow) -> Self {
        Self {
            id: row.id,
            domain: row.domain.clone(),
            code: row.code.clone(),
            success: row.success,
            saved: row.saved.to_f64().unwrap_or(0.0),
            before_total: row.before_total.and_then(|d| d.to_f64()),
            after_total: row.after_total.and_then(|d| d.to_f64()),
            created_at: row.created_at,
        }
    }
}

/// Serialise `rows` in the requested format.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub(crate) fn render(rows: &[TrainingRow], format: ExportFormat) -> anyhow::Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ExportFormat::Jsonl => {
            let mut out = String::new();
            for row in rows {
                out.push_str(&serde_json::to_string(row)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Export attempts newest first, optionally for one domain and for the
/// last `days` days.
///
/// # Errors
///
/// Returns an error if the query or serialisation fails.
pub(crate) async fn run_export(
    pool: &sqlx::PgPool,
    domain: Option<&str>,
    days: u32,
    format: ExportFormat,
) -> anyhow::Result<()> {
    let domain = domain
        .map(promodb_core::normalize_domain)
        .filter(|d| !d.is_empty());
    let since = (days > 0).then(|| Utc::now() - Duration::days(i64::from(days)));

    let rows = promodb_db::list_training_rows(pool, domain.as_deref(), since).await?;
    let rows: Vec<TrainingRow> = rows.iter().map(TrainingRow::from).collect();
    tracing::info!(count = rows.len(), "exporting training rows");

    let rendered = render(&rows, format)?;
    if format == ExportFormat::Jsonl {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}
