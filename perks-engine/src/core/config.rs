use super::error::{ConfigError, Result};
use crate::milestones::builtin_variants;
use serde::{Deserialize, Serialize};
use shared::models::{BundleRules, MilestoneKind, Variant};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Engine process configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ENVIRONMENT | development | Runtime environment |
/// | LOG_LEVEL | info | Default log filter |
/// | LOG_JSON | false | JSON console output |
/// | LOG_DIR | (unset) | Enables daily rolling log files |
/// | CART_STORE_URL | http://localhost:8080 | Cart store REST base URL |
/// | CATALOG_URL | http://localhost:8080 | Catalog REST base URL |
/// | CATALOG_TIMEOUT_MS | 3000 | Upper bound for one catalog lookup |
/// | MUTATION_RETRY_ATTEMPTS | 2 | Extra attempts for a failed cart mutation |
/// | MUTATION_RETRY_DELAY_MS | 200 | Pause between mutation attempts |
/// | PERKS_CONFIG_PATH | (unset) | JSON file with variants and bundle rules |
/// | DEFAULT_VARIANT | (unset) | Variant used when no assignment exists |
/// | DRY_RUN | false | Plan without mutating the cart |
///
/// # Example
///
/// ```ignore
/// CART_STORE_URL=https://carts.internal DRY_RUN=true perks-engine gid://cart/42
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,

    // === Collaborators ===
    pub cart_store_url: String,
    pub catalog_url: String,
    pub catalog_timeout_ms: u64,
    /// Retries after the first attempt
    pub mutation_retry_attempts: u32,
    pub mutation_retry_delay_ms: u64,

    // === Promotion ===
    pub perks_config_path: Option<String>,
    pub default_variant: Option<String>,
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse_or = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let flag = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(false)
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: flag("LOG_JSON"),
            log_dir: non_empty("LOG_DIR"),

            cart_store_url: lookup("CART_STORE_URL")
                .unwrap_or_else(|| "http://localhost:8080".into()),
            catalog_url: lookup("CATALOG_URL").unwrap_or_else(|| "http://localhost:8080".into()),
            catalog_timeout_ms: parse_or("CATALOG_TIMEOUT_MS", 3000),
            mutation_retry_attempts: lookup("MUTATION_RETRY_ATTEMPTS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(2),
            mutation_retry_delay_ms: parse_or("MUTATION_RETRY_DELAY_MS", 200),

            perks_config_path: non_empty("PERKS_CONFIG_PATH"),
            default_variant: non_empty("DEFAULT_VARIANT"),
            dry_run: flag("DRY_RUN"),
        }
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog_timeout_ms)
    }

    pub fn mutation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.mutation_retry_delay_ms)
    }

    /// Promotion config from `PERKS_CONFIG_PATH`, built-in defaults otherwise
    pub fn load_perks(&self) -> Result<PerksConfig> {
        match &self.perks_config_path {
            Some(path) => PerksConfig::from_file(path),
            None => Ok(PerksConfig::default()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_selector_option() -> String {
    "Color".to_string()
}

/// Promotion configuration: experiment variants and bundle rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerksConfig {
    /// First entry is the default variant
    #[serde(default = "builtin_variants")]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub bundles: BundleRules,
    /// Product option a free-item selector is matched against
    #[serde(default = "default_selector_option")]
    pub selector_option: String,
}

impl Default for PerksConfig {
    fn default() -> Self {
        Self {
            variants: builtin_variants(),
            bundles: BundleRules::default(),
            selector_option: default_selector_option(),
        }
    }
}

impl PerksConfig {
    /// Read and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            variants = config.variants.len(),
            "Loaded perks config"
        );
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(ConfigError::Invalid("at least one variant is required".into()));
        }

        let mut ids = HashSet::new();
        for variant in &self.variants {
            if variant.id.trim().is_empty() {
                return Err(ConfigError::Invalid("variant id must not be empty".into()));
            }
            if !ids.insert(variant.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate variant id '{}'",
                    variant.id
                )));
            }
            for milestone in &variant.milestones {
                if milestone.threshold.is_sign_negative() {
                    return Err(ConfigError::Invalid(format!(
                        "variant '{}' has a negative threshold {}",
                        variant.id, milestone.threshold
                    )));
                }
                if let MilestoneKind::FreeItem { handle, .. } = &milestone.kind
                    && handle.trim().is_empty()
                {
                    return Err(ConfigError::Invalid(format!(
                        "variant '{}' has a free item without a handle",
                        variant.id
                    )));
                }
            }
        }

        if self.bundles.default_size == 0 {
            return Err(ConfigError::Invalid("default bundle size must be at least 1".into()));
        }
        if let Some((name, _)) = self.bundles.sizes.iter().find(|(_, size)| **size == 0) {
            return Err(ConfigError::Invalid(format!(
                "bundle '{}' must require at least 1 item",
                name
            )));
        }
        if self.bundles.discount_code.trim().is_empty() {
            return Err(ConfigError::Invalid("bundle discount code must not be empty".into()));
        }

        Ok(())
    }
}
