//! Core types for the aggregation subsystem.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome category of one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Success,
    Partial,
    Failed,
    Cached,
    RateLimited,
    Timeout,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cached => write!(f, "CACHED"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// Standardized outcome of one provider call.
///
/// Invariants: `success` implies `data` is present (an explicitly empty
/// object is a valid payload); `status` must agree with `success`, `cached`,
/// and `error`. `consistent()` checks both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResult {
    pub source: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub cached: bool,
    pub response_time_ms: f64,
    pub status: ProviderStatus,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ProviderResult {
    pub fn ok(source: &str, data: Value) -> Self {
        Self {
            source: source.to_string(),
            success: true,
            data: Some(data),
            error: None,
            cached: false,
            response_time_ms: 0.0,
            status: ProviderStatus::Success,
            warnings: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn from_cache(source: &str, data: Value) -> Self {
        Self {
            cached: true,
            status: ProviderStatus::Cached,
            ..Self::ok(source, data)
        }
    }

    pub fn partial(source: &str, data: Value, warning: &str) -> Self {
        Self {
            status: ProviderStatus::Partial,
            warnings: vec![warning.to_string()],
            ..Self::ok(source, data)
        }
    }

    pub fn failed(source: &str, error: &str) -> Self {
        Self {
            source: source.to_string(),
            success: false,
            data: None,
            error: Some(error.to_string()),
            cached: false,
            response_time_ms: 0.0,
            status: ProviderStatus::Failed,
            warnings: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn rate_limited(source: &str) -> Self {
        Self {
            status: ProviderStatus::RateLimited,
            ..Self::failed(source, "rate limit exceeded")
        }
    }

    pub fn timed_out(source: &str, elapsed_ms: f64) -> Self {
        Self {
            status: ProviderStatus::Timeout,
            response_time_ms: elapsed_ms,
            ..Self::failed(source, &format!("timed out after {:.0}ms", elapsed_ms))
        }
    }

    /// Whether the status/success/cached/error fields agree.
    pub fn consistent(&self) -> bool {
        let status_ok = match self.status {
            ProviderStatus::Success | ProviderStatus::Partial => self.success && !self.cached,
            ProviderStatus::Cached => self.success && self.cached,
            ProviderStatus::Failed | ProviderStatus::RateLimited | ProviderStatus::Timeout => !self.success,
        };
        let data_ok = if self.success { self.data.is_some() } else { true };
        status_ok && data_ok
    }
}

/// Per-pass context handed to each provider alongside the coordinate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryContext {
    pub municipality: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Errors a provider call can surface to the engine. Well-behaved providers
/// fold failures into `ProviderResult` instead, but the engine tolerates
/// both (and task panics on top).
#[derive(Debug)]
pub enum ProviderError {
    Network(String),
    InvalidResponse(String),
    RateLimited(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            Self::RateLimited(msg) => write!(f, "rate limited: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Summary of one engine pass across all attempted providers.
///
/// Created fresh per `execute()` call, immutable once returned. Every
/// attempted provider lands in exactly one of `providers_succeeded` /
/// `providers_failed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Successful payloads keyed by provider name.
    pub data: BTreeMap<String, Value>,
    pub providers_succeeded: Vec<String>,
    pub providers_failed: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub total_time_ms: f64,
}

impl AggregationResult {
    /// Contract check: no provider may appear in both lists or in neither.
    pub fn accounts_for(&self, attempted: &[String]) -> bool {
        attempted.iter().all(|name| {
            self.providers_succeeded.contains(name) != self.providers_failed.contains(name)
        })
    }
}
