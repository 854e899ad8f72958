pub mod cache;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod pipeline;
pub mod robots;

pub use cache::{CacheStore, FetchCache, MemoryCacheStore, MAX_STORED_CODES};
pub use error::ScraperError;
pub use extract::{extract_tokens, TokenRules};
pub use fetch::{fetch_and_scrape, FetchedPage, HttpFetcher, PageFetcher};
pub use html::{scrape_html, visible_text, PROXIMITY_RADIUS};
pub use pipeline::{candidate_urls, scrape, ScrapeRequest, DEFAULT_SCRAPE_LIMIT, MAX_CANDIDATE_URLS};
pub use robots::{robots_allowed, robots_txt_allows, robots_url, BOT_AGENT};
