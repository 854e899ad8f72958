use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_domain;
use crate::ConfigError;

/// Token pattern used when neither the retailer nor its platform configures one.
pub const DEFAULT_TOKEN_PATTERN: &str = r"[A-Z0-9][A-Z0-9\-]{4,14}";

/// Platform key used when a retailer names no platform, or names one that is
/// not configured.
pub const GENERIC_PLATFORM: &str = "generic";

pub const DEFAULT_CANDIDATE_PATHS: &[&str] = &[
    "/",
    "/sale",
    "/offers",
    "/promo",
    "/promotions",
    "/discount",
    "/voucher",
    "/vouchers",
];

/// Scrape heuristics as they appear in the adapters file. Every field is
/// independently optional so that retailer entries can override a single
/// field of their platform's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSettings {
    #[serde(default, alias = "token_re", skip_serializing_if = "Option::is_none")]
    pub token_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
}

impl ScrapeSettings {
    /// Lay `other` over `self`. Each field of `other` that is present and
    /// non-empty replaces the corresponding field of `self`.
    #[must_use]
    pub fn overlaid_with(&self, other: &ScrapeSettings) -> ScrapeSettings {
        ScrapeSettings {
            token_pattern: other
                .token_pattern
                .clone()
                .filter(|p| !p.is_empty())
                .or_else(|| self.token_pattern.clone()),
            keywords: pick(other.keywords.as_ref(), self.keywords.as_ref()),
            stop: pick(other.stop.as_ref(), self.stop.as_ref()),
            paths: pick(other.paths.as_ref(), self.paths.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub scrape: ScrapeSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerConfig {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub scrape: ScrapeSettings,
}

impl RetailerConfig {
    fn matches(&self, domain: &str) -> bool {
        normalize_domain(&self.domain) == domain
            || self.aliases.iter().any(|a| normalize_domain(a) == domain)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptersFile {
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformConfig>,
    #[serde(default)]
    pub retailers: Vec<RetailerConfig>,
}

/// Fully merged scrape settings for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetailerScrapeConfig {
    pub platform: String,
    pub token_pattern: String,
    pub keywords: Vec<String>,
    pub stop: Vec<String>,
    pub paths: Vec<String>,
}

impl Default for RetailerScrapeConfig {
    fn default() -> Self {
        AdaptersFile::default().resolve("")
    }
}

/// Retailer value wins when it is present and non-empty; otherwise the
/// platform value is used whenever it is present, even if empty.
fn pick<T: Clone>(retailer: Option<&Vec<T>>, platform: Option<&Vec<T>>) -> Option<Vec<T>> {
    match retailer {
        Some(v) if !v.is_empty() => Some(v.clone()),
        _ => platform.cloned(),
    }
}

impl AdaptersFile {
    /// Find the retailer entry whose domain or alias matches `domain`.
    #[must_use]
    pub fn retailer(&self, domain: &str) -> Option<&RetailerConfig> {
        let domain = normalize_domain(domain);
        self.retailers.iter().find(|r| r.matches(&domain))
    }

    /// Resolve the merged scrape configuration for `domain`.
    ///
    /// Retailer overrides are laid over the retailer's platform, which falls
    /// back to the `generic` platform and finally to built-in defaults.
    #[must_use]
    pub fn resolve(&self, domain: &str) -> RetailerScrapeConfig {
        let retailer = self.retailer(domain);
        self.resolve_with(retailer.and_then(|r| r.platform.as_deref()), retailer.map(|r| &r.scrape))
    }

    /// Resolve `domain` with per-request `overrides` laid over the
    /// retailer's configured overrides.
    #[must_use]
    pub fn resolve_overridden(
        &self,
        domain: &str,
        overrides: Option<&ScrapeSettings>,
    ) -> RetailerScrapeConfig {
        let Some(overrides) = overrides else {
            return self.resolve(domain);
        };
        let retailer = self.retailer(domain);
        let merged = retailer
            .map(|r| r.scrape.clone())
            .unwrap_or_default()
            .overlaid_with(overrides);
        self.resolve_with(retailer.and_then(|r| r.platform.as_deref()), Some(&merged))
    }

    /// Resolve against explicit overrides instead of a configured retailer.
    #[must_use]
    pub fn resolve_with(
        &self,
        platform: Option<&str>,
        overrides: Option<&ScrapeSettings>,
    ) -> RetailerScrapeConfig {
        let platform_key = platform
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(GENERIC_PLATFORM);

        let base = self
            .platforms
            .get(platform_key)
            .or_else(|| self.platforms.get(GENERIC_PLATFORM))
            .map(|p| &p.scrape);

        let empty = ScrapeSettings::default();
        let over = overrides.unwrap_or(&empty);
        let base = base.unwrap_or(&empty);

        let token_pattern = match over.token_pattern.as_deref() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => base
                .token_pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_PATTERN.to_string()),
        };

        let keywords =
            pick(over.keywords.as_ref(), base.keywords.as_ref()).unwrap_or_default();
        let stop = pick(over.stop.as_ref(), base.stop.as_ref()).unwrap_or_default();
        let paths = pick(over.paths.as_ref(), base.paths.as_ref()).unwrap_or_else(|| {
            DEFAULT_CANDIDATE_PATHS
                .iter()
                .map(|p| (*p).to_string())
                .collect()
        });

        RetailerScrapeConfig {
            platform: platform_key.to_string(),
            token_pattern,
            keywords,
            stop,
            paths,
        }
    }
}

/// Load and validate the adapters configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_adapters(path: &Path) -> Result<AdaptersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AdaptersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_adapters(&content)
}

/// Parse and validate adapters YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the document cannot be parsed or fails validation.
pub fn parse_adapters(content: &str) -> Result<AdaptersFile, ConfigError> {
    let adapters: AdaptersFile =
        serde_yaml::from_str(content).map_err(ConfigError::AdaptersFileParse)?;

    validate_adapters(&adapters)?;

    Ok(adapters)
}

fn validate_settings(owner: &str, settings: &ScrapeSettings) -> Result<(), ConfigError> {
    if let Some(pattern) = settings.token_pattern.as_deref() {
        if let Err(e) = Regex::new(pattern) {
            return Err(ConfigError::Validation(format!(
                "{owner} has invalid token pattern '{pattern}': {e}"
            )));
        }
    }

    if let Some(keywords) = &settings.keywords {
        if keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{owner} has an empty keyword"
            )));
        }
    }

    Ok(())
}

fn validate_adapters(adapters: &AdaptersFile) -> Result<(), ConfigError> {
    for (key, platform) in &adapters.platforms {
        validate_settings(&format!("platform '{key}'"), &platform.scrape)?;
    }

    let mut seen_domains = HashSet::new();

    for retailer in &adapters.retailers {
        let domain = normalize_domain(&retailer.domain);
        if domain.is_empty() {
            return Err(ConfigError::Validation(
                "retailer domain must be non-empty".to_string(),
            ));
        }

        for candidate in std::iter::once(&retailer.domain).chain(&retailer.aliases) {
            let normalized = normalize_domain(candidate);
            if normalized.is_empty() {
                continue;
            }
            if !seen_domains.insert(normalized.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate retailer domain: '{normalized}' (from retailer '{domain}')"
                )));
            }
        }

        validate_settings(&format!("retailer '{domain}'"), &retailer.scrape)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "adapters_test.rs"]
mod tests;
