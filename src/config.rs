//! Explicit configuration values, constructed once and injected.
//!
//! There is deliberately no global config singleton: the engine and the CLI
//! each receive the config they were built with, so parallel test runs never
//! observe each other's settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 3600;
const DEFAULT_MAX_LIST_ITEMS: usize = 40;

/// Per-provider knobs. Each provider owns its own rate limit and cache TTL;
/// the engine only enforces the outer timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Requests per second the provider allows itself.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Per-call deadline override; falls back to the engine default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            cache_ttl_secs: default_cache_ttl(),
            timeout_secs: None,
            enabled: true,
        }
    }
}

fn default_rate_limit() -> f64 {
    2.0
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_enabled() -> bool {
    true
}

/// Engine-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_timeout")]
    pub default_timeout_secs: u64,
    /// Soft cap on simultaneously running provider tasks. None = unbounded.
    #[serde(default)]
    pub max_parallel_providers: Option<usize>,
    /// Cap on merged list fields (amenities, surrounding uses).
    #[serde(default = "default_max_list_items")]
    pub max_list_items: usize,
    /// Per-provider overrides, keyed by provider name.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_parallel_providers: None,
            max_list_items: DEFAULT_MAX_LIST_ITEMS,
            providers: BTreeMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_list_items() -> usize {
    DEFAULT_MAX_LIST_ITEMS
}

impl EngineConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&data).map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    /// Effective settings for a provider: its override, or the defaults.
    pub fn provider(&self, name: &str) -> ProviderConfig {
        self.providers.get(name).cloned().unwrap_or_default()
    }

    /// Effective per-call deadline for a provider.
    pub fn timeout_for(&self, name: &str) -> Duration {
        let secs = self
            .providers
            .get(name)
            .and_then(|p| p.timeout_secs)
            .unwrap_or(self.default_timeout_secs);
        Duration::from_secs(secs)
    }

    /// True unless the provider is explicitly disabled.
    pub fn enabled(&self, name: &str) -> bool {
        self.providers.get(name).map(|p| p.enabled).unwrap_or(true)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(String, String),
    Parse(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, msg) => write!(f, "Cannot read config '{}': {}", path, msg),
            Self::Parse(path, msg) => write!(f, "Invalid config '{}': {}", path, msg),
        }
    }
}

impl std::error::Error for ConfigError {}
