use crate::app_config::{AppConfig, Environment};
use crate::normalize::normalize_domain;
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 PromoDbBot/1.0";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("PROMODB_ENV", "development"))?;

    let bind_addr = parse("PROMODB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PROMODB_LOG_LEVEL", "info");
    let adapters_path = PathBuf::from(or_default(
        "PROMODB_ADAPTERS_PATH",
        "./config/adapters.yaml",
    ));

    let db_max_connections = parse_u32("PROMODB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PROMODB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PROMODB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scrape_timeout_secs = parse_u64("PROMODB_SCRAPE_TIMEOUT_SECS", "7")?;
    let scrape_ttl_secs = parse_u64("PROMODB_SCRAPE_TTL_SECS", "600")?;
    let scraper_user_agent = or_default("PROMODB_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let event_retention_days = parse_u32("PROMODB_EVENT_RETENTION_DAYS", "180")?;

    let allowlist_domains = or_default("PROMODB_ALLOWLIST_DOMAINS", "")
        .split(',')
        .map(normalize_domain)
        .filter(|d| !d.is_empty())
        .collect();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        adapters_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scrape_timeout_secs,
        scrape_ttl_secs,
        scraper_user_agent,
        event_retention_days,
        allowlist_domains,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PROMODB_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
