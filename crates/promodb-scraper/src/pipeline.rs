use promodb_core::{normalize_domain, RetailerScrapeConfig};
use reqwest::Url;

use crate::cache::{CacheStore, FetchCache};
use crate::extract::{dedup, TokenRules};
use crate::fetch::PageFetcher;
use crate::html::scrape_html;

/// Upper bound on pages visited per scrape.
pub const MAX_CANDIDATE_URLS: usize = 6;

pub const DEFAULT_SCRAPE_LIMIT: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    pub domain: String,
    pub url: Option<String>,
    /// Literal page markup. When non-empty no network request is made.
    pub html: Option<String>,
    pub limit: usize,
}

/// Candidate URLs for `domain`: the explicit `url` first, then each path
/// joined onto `https://{domain}`. Paths that do not form a valid URL are
/// skipped.
#[must_use]
pub fn candidate_urls(domain: &str, url: Option<&str>, paths: &[String]) -> Vec<String> {
    let mut urls: Vec<String> = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .into_iter()
        .collect();

    if domain.is_empty() {
        return urls;
    }

    if let Ok(base) = Url::parse(&format!("https://{domain}")) {
        urls.extend(
            paths
                .iter()
                .filter_map(|p| base.join(p).ok())
                .map(String::from),
        );
    }

    urls
}

/// Scrape candidate codes for one request.
///
/// Supplied markup is scraped directly. Otherwise up to
/// [`MAX_CANDIDATE_URLS`] candidate pages are visited in order through the
/// fetch cache, stopping once `limit` distinct codes have been collected.
pub async fn scrape<S: CacheStore, F: PageFetcher>(
    cache: &FetchCache<S, F>,
    config: &RetailerScrapeConfig,
    request: &ScrapeRequest,
) -> Vec<String> {
    let rules = TokenRules::from_config(config);

    if let Some(html) = request.html.as_deref().filter(|h| !h.is_empty()) {
        let mut codes = scrape_html(html, &rules);
        codes.truncate(request.limit);
        return codes;
    }

    let domain = normalize_domain(&request.domain);
    let urls = candidate_urls(&domain, request.url.as_deref(), &config.paths);

    let mut found: Vec<String> = Vec::new();
    for url in urls.iter().take(MAX_CANDIDATE_URLS) {
        let codes = cache.cached_fetch(&domain, url, &rules).await;
        found = dedup(found.into_iter().chain(codes));
        if found.len() >= request.limit {
            break;
        }
    }

    tracing::debug!(
        domain = %domain,
        platform = %config.platform,
        found = found.len(),
        "scrape complete"
    );

    found.truncate(request.limit);
    found
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
