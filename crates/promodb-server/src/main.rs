mod api;
mod middleware;
mod prune;
mod scheduler;
mod stores;

use std::sync::Arc;

use promodb_ranking::PruneThrottle;
use promodb_scraper::{FetchCache, HttpFetcher};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    stores::PgCacheStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(promodb_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let adapters = Arc::new(promodb_core::load_adapters(&config.adapters_path)?);
    tracing::info!(
        path = %config.adapters_path.display(),
        platforms = adapters.platforms.len(),
        retailers = adapters.retailers.len(),
        "adapters loaded"
    );

    let pool_config = promodb_db::PoolConfig::from_app_config(&config);
    let pool = promodb_db::connect_pool(&config.database_url, pool_config).await?;
    promodb_db::run_migrations(&pool).await?;

    let fetcher = HttpFetcher::new(config.scrape_timeout_secs, &config.scraper_user_agent)?;
    let cache = Arc::new(FetchCache::new(
        PgCacheStore::new(pool.clone()),
        fetcher,
        config.scrape_ttl_secs,
    ));
    let prune = Arc::new(PruneThrottle::new());

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&prune),
        config.event_retention_days,
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        promodb_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        adapters,
        cache,
        prune,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "promodb-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
