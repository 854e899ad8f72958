use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded use of a promo code, reduced to the fields the ranking side
/// reads. Persistence rows carry more columns than this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub domain: String,
    pub code: String,
    pub success: bool,
    /// Amount saved; `None` is treated as zero.
    pub saved: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A previously scraped code list for one `(domain, url)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFetch {
    pub domain: String,
    pub url: String,
    pub codes: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}
