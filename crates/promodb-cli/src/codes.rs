//! `codes` command: scrape candidate codes for one domain.

use std::path::PathBuf;

use promodb_core::{normalize_domain, AdaptersFile, AppConfig};
use promodb_scraper::{
    robots_allowed, robots_url, FetchCache, HttpFetcher, MemoryCacheStore, PageFetcher,
    ScrapeRequest,
};

#[derive(Debug, Clone)]
pub(crate) struct CodesArgs {
    pub domain: String,
    pub url: Option<String>,
    pub html_file: Option<PathBuf>,
    pub limit: usize,
}

/// Reject domains outside `PROMODB_ALLOWLIST_DOMAINS`. Returns the
/// normalised domain.
pub(crate) fn check_allowlist(config: &AppConfig, raw: &str) -> anyhow::Result<String> {
    let domain = normalize_domain(raw);
    if domain.is_empty() {
        anyhow::bail!("domain is required");
    }
    if !config.domain_allowed(&domain) {
        anyhow::bail!("domain '{domain}' is not in PROMODB_ALLOWLIST_DOMAINS");
    }
    Ok(domain)
}

/// Scrape codes with the configured HTTP fetcher.
///
/// # Errors
///
/// Returns an error if the domain is not allowed, the HTML file cannot be
/// read, the HTTP client cannot be built, or robots.txt disallows the bot.
pub(crate) async fn run_codes(
    config: &AppConfig,
    adapters: &AdaptersFile,
    args: &CodesArgs,
) -> anyhow::Result<Vec<String>> {
    let fetcher = HttpFetcher::new(config.scrape_timeout_secs, &config.scraper_user_agent)?;
    run_codes_with(fetcher, config, adapters, args).await
}

pub(crate) async fn run_codes_with<F: PageFetcher>(
    fetcher: F,
    config: &AppConfig,
    adapters: &AdaptersFile,
    args: &CodesArgs,
) -> anyhow::Result<Vec<String>> {
    let domain = check_allowlist(config, &args.domain)?;
    let scrape_config = adapters.resolve(&domain);

    let html = match &args.html_file {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?,
        ),
        None => None,
    };

    let live = html.as_deref().is_none_or(str::is_empty);
    if live && !robots_allowed(&fetcher, &robots_url(&domain)).await {
        anyhow::bail!("robots.txt for {domain} disallows scraping");
    }

    let cache = FetchCache::new(MemoryCacheStore::new(), fetcher, config.scrape_ttl_secs);
    let request = ScrapeRequest {
        domain: domain.clone(),
        url: args.url.clone(),
        html,
        limit: args.limit,
    };
    let codes = promodb_scraper::scrape(&cache, &scrape_config, &request).await;

    tracing::info!(
        domain = %domain,
        platform = %scrape_config.platform,
        count = codes.len(),
        "codes scraped"
    );
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use promodb_core::Environment;
    use promodb_scraper::{FetchedPage, ScraperError};

    use super::*;

    struct PageMap {
        pages: HashMap<String, FetchedPage>,
        calls: Arc<AtomicUsize>,
    }

    impl PageMap {
        fn new(pages: &[(&str, u16, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, status, body)| {
                        (
                            (*url).to_string(),
                            FetchedPage {
                                status: *status,
                                body: (*body).to_string(),
                            },
                        )
                    })
                    .collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl PageFetcher for PageMap {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.get(url).cloned().unwrap_or(FetchedPage {
                status: 404,
                body: String::new(),
            }))
        }
    }

    fn config(allowlist: &[&str]) -> AppConfig {
        AppConfig {
            database_url: "postgres://unused".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            log_level: "info".to_string(),
            adapters_path: PathBuf::from("./config/adapters.yaml"),
            db_max_connections: 1,
            db_min_connections: 0,
            db_acquire_timeout_secs: 1,
            scrape_timeout_secs: 1,
            scrape_ttl_secs: 600,
            scraper_user_agent: "promodb-test".to_string(),
            event_retention_days: 180,
            allowlist_domains: allowlist.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    fn adapters() -> AdaptersFile {
        promodb_core::parse_adapters(
            r"
platforms:
  generic:
    scrape:
      keywords: [code]
      stop: [CHECKOUT]
      paths: [/, /sale]
",
        )
        .expect("adapters")
    }

    fn args(domain: &str) -> CodesArgs {
        CodesArgs {
            domain: domain.to_string(),
            url: None,
            html_file: None,
            limit: 10,
        }
    }

    #[test]
    fn allowlist_rejects_other_domains() {
        let cfg = config(&["shop.test"]);
        assert_eq!(
            check_allowlist(&cfg, "https://www.shop.test/").expect("allowed"),
            "shop.test"
        );
        assert!(check_allowlist(&cfg, "other.test").is_err());
        assert!(check_allowlist(&config(&[]), "other.test").is_ok());
        assert!(check_allowlist(&config(&[]), "  ").is_err());
    }

    #[tokio::test]
    async fn live_scrape_walks_candidate_paths() {
        let fetcher = PageMap::new(&[
            ("https://shop.test/robots.txt", 404, ""),
            ("https://shop.test/", 200, "<p>Use code WELCOME10 today</p>"),
            ("https://shop.test/sale", 200, "<p>Sale code SPRING25 at checkout</p>"),
        ]);
        let calls = Arc::clone(&fetcher.calls);
        let codes = run_codes_with(fetcher, &config(&[]), &adapters(), &args("shop.test"))
            .await
            .expect("codes");

        assert!(codes.contains(&"WELCOME10".to_string()));
        assert!(codes.contains(&"SPRING25".to_string()));
        assert!(!codes.contains(&"CHECKOUT".to_string()));
        // robots.txt plus both candidate pages
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn robots_disallow_blocks_live_scrape() {
        let fetcher = PageMap::new(&[(
            "https://shop.test/robots.txt",
            200,
            "User-agent: PromoDbBot\nDisallow: /\n",
        )]);
        let err = run_codes_with(fetcher, &config(&[]), &adapters(), &args("shop.test"))
            .await
            .expect_err("robots should block");
        assert!(err.to_string().contains("robots.txt"));
    }

    #[tokio::test]
    async fn html_file_skips_network() {
        let path = std::env::temp_dir().join(format!(
            "promodb-cli-codes-{}.html",
            std::process::id()
        ));
        std::fs::write(&path, "<p>Use code SAVE20NOW at checkout</p>").expect("temp file");

        let fetcher = PageMap::new(&[]);
        let calls = Arc::clone(&fetcher.calls);
        let mut request = args("shop.test");
        request.html_file = Some(path.clone());
        let codes = run_codes_with(fetcher, &config(&[]), &adapters(), &request).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(codes.expect("codes"), vec!["SAVE20NOW"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_html_file_is_an_error() {
        let mut request = args("shop.test");
        request.html_file = Some(PathBuf::from("/definitely/not/here.html"));
        let err = run_codes_with(PageMap::new(&[]), &config(&[]), &adapters(), &request)
            .await
            .expect_err("missing file");
        assert!(err.to_string().contains("failed to read"));
    }
}
