use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub adapters_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Hard ceiling for a single storefront page fetch.
    pub scrape_timeout_secs: u64,
    /// How long a scraped page's codes stay fresh in the fetch cache.
    pub scrape_ttl_secs: u64,
    pub scraper_user_agent: String,
    /// Attempts older than this are pruned. `0` disables pruning.
    pub event_retention_days: u32,
    /// Domains the CLI may scrape. Empty means every domain is allowed.
    pub allowlist_domains: Vec<String>,
}

impl AppConfig {
    /// Whether `domain` (already normalized) passes the configured allowlist.
    #[must_use]
    pub fn domain_allowed(&self, domain: &str) -> bool {
        self.allowlist_domains.is_empty() || self.allowlist_domains.iter().any(|d| d == domain)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("adapters_path", &self.adapters_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scrape_timeout_secs", &self.scrape_timeout_secs)
            .field("scrape_ttl_secs", &self.scrape_ttl_secs)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("event_retention_days", &self.event_retention_days)
            .field("allowlist_domains", &self.allowlist_domains)
            .finish()
    }
}
