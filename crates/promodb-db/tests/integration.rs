//! Offline unit tests for promodb-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use promodb_core::{AppConfig, CachedFetch, Environment};
use promodb_db::{AttemptRow, PoolConfig, ScrapeCacheRow};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        adapters_path: PathBuf::from("./config/adapters.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scrape_timeout_secs: 7,
        scrape_ttl_secs: 600,
        scraper_user_agent: "ua".to_string(),
        event_retention_days: 180,
        allowlist_domains: Vec::new(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn attempt_row_converts_to_ranking_record() {
    let now = Utc::now();
    let row = AttemptRow {
        id: 1,
        domain: "shop.test".to_string(),
        code: "SAVE10".to_string(),
        success: false,
        saved: Decimal::new(1250, 2),
        before_total: None,
        after_total: None,
        anon_id: None,
        user_agent: None,
        created_at: now,
    };

    let record = row.to_record();
    assert_eq!(record.code, "SAVE10");
    assert!(!record.success);
    assert_eq!(record.saved, Some(12.5));
    assert_eq!(record.created_at, now);
}

#[test]
fn scrape_cache_row_converts_to_cached_fetch() {
    let now = Utc::now();
    let row = ScrapeCacheRow {
        id: 9,
        domain: "shop.test".to_string(),
        url: "https://shop.test/sale".to_string(),
        codes: sqlx::types::Json(vec!["SAVE10".to_string()]),
        fetched_at: now,
    };

    let entry = CachedFetch::from(row);
    assert_eq!(entry.url, "https://shop.test/sale");
    assert_eq!(entry.codes, vec!["SAVE10"]);
    assert_eq!(entry.fetched_at, now);
}
