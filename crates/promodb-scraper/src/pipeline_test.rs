use std::collections::HashMap;
use std::sync::Mutex;

use promodb_core::{AdaptersFile, DEFAULT_CANDIDATE_PATHS};

use super::*;
use crate::cache::MemoryCacheStore;
use crate::error::ScraperError;
use crate::fetch::FetchedPage;

/// Serves pages from a URL map and records the order of requests.
#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, String>,
    visited: Mutex<Vec<String>>,
}

impl MapFetcher {
    fn with(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, b)| ((*u).to_string(), (*b).to_string()))
                .collect(),
            visited: Mutex::new(Vec::new()),
        }
    }

    fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(match self.pages.get(url) {
            Some(body) => FetchedPage {
                status: 200,
                body: body.clone(),
            },
            None => FetchedPage {
                status: 404,
                body: String::new(),
            },
        })
    }
}

fn cache(fetcher: MapFetcher) -> FetchCache<MemoryCacheStore, MapFetcher> {
    FetchCache::new(MemoryCacheStore::new(), fetcher, 600)
}

fn generic_config() -> RetailerScrapeConfig {
    let mut config = AdaptersFile::default().resolve("shop.test");
    config.stop = vec!["CHECKOUT".to_string()];
    config.keywords = vec!["code".to_string()];
    config
}

fn request(limit: usize) -> ScrapeRequest {
    ScrapeRequest {
        domain: "https://www.shop.test".to_string(),
        url: None,
        html: None,
        limit,
    }
}

#[test]
fn candidate_urls_put_explicit_url_first() {
    let paths: Vec<String> = DEFAULT_CANDIDATE_PATHS.iter().map(|p| (*p).to_string()).collect();
    let urls = candidate_urls("shop.test", Some("https://shop.test/deal"), &paths);
    assert_eq!(urls.len(), 9);
    assert_eq!(urls[0], "https://shop.test/deal");
    assert_eq!(urls[1], "https://shop.test/");
    assert_eq!(urls[2], "https://shop.test/sale");
    assert_eq!(urls[8], "https://shop.test/vouchers");
}

#[test]
fn candidate_urls_empty_domain_and_no_url_is_empty() {
    let paths = vec!["/".to_string()];
    assert!(candidate_urls("", None, &paths).is_empty());
}

#[tokio::test]
async fn literal_html_is_scraped_without_network() {
    let cache = cache(MapFetcher::default());
    let mut req = request(10);
    req.html = Some("<p>Use code SAVE20NOW at checkout</p>".to_string());

    let codes = scrape(&cache, &generic_config(), &req).await;

    assert_eq!(codes, vec!["SAVE20NOW"]);
    assert!(cache.fetcher().visited().is_empty());
}

#[tokio::test]
async fn literal_html_respects_limit() {
    let cache = cache(MapFetcher::default());
    let mut req = request(2);
    req.html = Some("<p>ALPHA1 BRAVO2 CHARLIE3 DELTA4</p>".to_string());

    let codes = scrape(&cache, &generic_config(), &req).await;
    assert_eq!(codes, vec!["ALPHA1", "BRAVO2"]);
}

#[tokio::test]
async fn empty_html_falls_through_to_fetching() {
    let cache = cache(MapFetcher::with(&[(
        "https://shop.test/",
        "<p>code WELCOME10</p>",
    )]));
    let mut req = request(10);
    req.html = Some(String::new());

    let codes = scrape(&cache, &generic_config(), &req).await;
    assert_eq!(codes, vec!["WELCOME10"]);
}

#[tokio::test]
async fn visits_at_most_six_urls_in_order() {
    let cache = cache(MapFetcher::default());
    let mut req = request(50);
    req.url = Some("https://shop.test/landing".to_string());

    let codes = scrape(&cache, &generic_config(), &req).await;

    assert!(codes.is_empty());
    assert_eq!(
        cache.fetcher().visited(),
        vec![
            "https://shop.test/landing",
            "https://shop.test/",
            "https://shop.test/sale",
            "https://shop.test/offers",
            "https://shop.test/promo",
            "https://shop.test/promotions",
        ]
    );
}

#[tokio::test]
async fn accumulates_across_pages_without_duplicates() {
    let cache = cache(MapFetcher::with(&[
        ("https://shop.test/", "<p>code SPRING25 and FREESHIP</p>"),
        ("https://shop.test/sale", "<p>FREESHIP or SUMMER30</p>"),
    ]));

    let codes = scrape(&cache, &generic_config(), &request(50)).await;
    assert_eq!(codes, vec!["SPRING25", "FREESHIP", "SUMMER30"]);
}

#[tokio::test]
async fn stops_early_once_limit_is_reached() {
    let cache = cache(MapFetcher::with(&[
        ("https://shop.test/", "<p>SPRING25 FREESHIP</p>"),
        ("https://shop.test/sale", "<p>SUMMER30</p>"),
    ]));

    let codes = scrape(&cache, &generic_config(), &request(2)).await;

    assert_eq!(codes, vec!["SPRING25", "FREESHIP"]);
    assert_eq!(cache.fetcher().visited(), vec!["https://shop.test/"]);
}

#[tokio::test]
async fn result_never_exceeds_limit() {
    let cache = cache(MapFetcher::with(&[(
        "https://shop.test/",
        "<p>ALPHA1 BRAVO2 CHARLIE3 DELTA4 ECHO55</p>",
    )]));

    let codes = scrape(&cache, &generic_config(), &request(3)).await;
    assert_eq!(codes.len(), 3);
}

#[tokio::test]
async fn empty_domain_without_html_or_url_is_empty() {
    let cache = cache(MapFetcher::default());
    let req = ScrapeRequest {
        domain: String::new(),
        url: None,
        html: None,
        limit: 10,
    };

    let codes = scrape(&cache, &generic_config(), &req).await;
    assert!(codes.is_empty());
    assert!(cache.fetcher().visited().is_empty());
}

#[tokio::test]
async fn second_scrape_within_ttl_hits_cache() {
    let cache = cache(MapFetcher::with(&[("https://shop.test/", "<p>SPRING25</p>")]));
    let config = RetailerScrapeConfig {
        paths: vec!["/".to_string()],
        ..generic_config()
    };

    let first = scrape(&cache, &config, &request(10)).await;
    let second = scrape(&cache, &config, &request(10)).await;

    assert_eq!(first, second);
    assert_eq!(cache.fetcher().visited().len(), 1);
}
