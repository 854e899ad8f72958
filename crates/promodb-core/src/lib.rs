pub mod adapters;
pub mod app_config;
pub mod config;
pub mod normalize;
pub mod records;

pub use adapters::{
    load_adapters, parse_adapters, AdaptersFile, PlatformConfig, RetailerConfig, RetailerScrapeConfig,
    ScrapeSettings, DEFAULT_CANDIDATE_PATHS, DEFAULT_TOKEN_PATTERN, GENERIC_PLATFORM,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{normalize_code, normalize_domain};
pub use records::{AttemptRecord, CachedFetch};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read adapters file {path}: {source}")]
    AdaptersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse adapters file: {0}")]
    AdaptersFileParse(#[from] serde_yaml::Error),

    #[error("adapters validation failed: {0}")]
    Validation(String),
}
