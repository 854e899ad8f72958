use std::collections::HashSet;

use promodb_core::normalize_code;

pub const DEFAULT_SUGGEST_LIMIT: usize = 25;

/// Merge suggestion sources in priority order: catalogued inventory, codes
/// that recently worked, freshly scraped codes, then seeded codes. Codes are
/// normalised, de-duplicated, and truncated to `limit`.
#[must_use]
pub fn merge_suggestions(
    inventory: &[String],
    recent_successes: &[String],
    scraped: &[String],
    seeds: &[String],
    limit: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();
    inventory
        .iter()
        .chain(recent_successes)
        .chain(scraped)
        .chain(seeds)
        .map(|c| normalize_code(c))
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .take(limit)
        .collect()
}
