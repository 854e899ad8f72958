use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::extract::TokenRules;
use crate::html::scrape_html;

/// Status and body of one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of storefront pages. Implementations enforce their own timeout.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, ScraperError>> + Send;
}

/// [`PageFetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the given per-request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage { status, body })
    }
}

/// Fetch `url` and scrape its body. Network errors and non-2xx responses
/// are logged and yield no codes.
pub async fn fetch_and_scrape<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    rules: &TokenRules,
) -> Vec<String> {
    match fetcher.fetch(url).await {
        Ok(page) if page.is_success() => scrape_html(&page.body, rules),
        Ok(page) => {
            let e = ScraperError::UnexpectedStatus {
                status: page.status,
                url: url.to_string(),
            };
            tracing::warn!(url, error = %e, "page fetch returned non-success status");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "page fetch failed");
            Vec::new()
        }
    }
}
