//! Locus Atlas — location intelligence aggregation core.
//!
//! Queries many independent, heterogeneous sources about one geographic
//! point, tolerates partial failure across the fan-out, merges conflicting
//! answers under a static authority-priority policy, and scores the merged
//! record for completeness.
//!
//! Pipeline: `AggregationEngine::execute` → `ResultMerger::merge` →
//! `CompletenessValidator::validate`.

pub mod aggregate;
pub mod bearing;
pub mod cache;
pub mod config;
pub mod overview;

pub use aggregate::{
    AggregationEngine, AggregationResult, CompletenessValidator, Provider, ProviderError,
    ProviderRegistry, ProviderResult, ProviderStatus, QueryContext, ResultMerger, SourceType,
    StaticProvider, ValidationReport,
};
pub use cache::{cache_key, CacheStore, DiskCache, MemoryCache};
pub use config::{ConfigError, EngineConfig, ProviderConfig};
pub use overview::LocationOverview;
