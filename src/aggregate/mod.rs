//! Location data aggregation subsystem.
//!
//! Fans out one coordinate to every applicable provider concurrently,
//! tolerates partial failure, merges conflicting answers under a static
//! source-priority policy, and scores the merged record for completeness.

pub mod engine;
pub mod merge;
pub mod provider;
pub mod types;
pub mod validate;

pub use engine::AggregationEngine;
pub use merge::ResultMerger;
pub use provider::{Provider, ProviderRegistry, SourceType, StaticProvider};
pub use types::{AggregationResult, ProviderError, ProviderResult, ProviderStatus, QueryContext};
pub use validate::{CompletenessValidator, ValidationReport};
