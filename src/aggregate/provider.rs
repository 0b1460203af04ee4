//! The provider contract, the name-keyed registry, and the static
//! source-priority table used for conflict resolution at merge time.
//!
//! Concrete network providers live outside this crate; `StaticProvider`
//! serves canned payloads for demos, fixtures, and tests.

use super::types::{ProviderError, ProviderResult, QueryContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Kind of external source, in descending order of authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Authoritative / paid registries (land registry, parcel fabric).
    Authoritative,
    /// Municipal open-data portals.
    MunicipalOpenData,
    /// Heritage, brownfield, and conservation-authority registries.
    HeritageRegistry,
    /// Provincial registries and plans.
    Provincial,
    /// Transit feeds and census tables.
    TransitCensus,
    /// Global crowd-sourced data.
    CrowdSourced,
    /// Inferred or default values.
    Inferred,
}

impl SourceType {
    /// Static merge priority — highest wins a field conflict. The table is
    /// fixed data, never derived from call order.
    pub fn priority(self) -> u32 {
        match self {
            Self::Authoritative => 100,
            Self::MunicipalOpenData => 80,
            Self::HeritageRegistry => 70,
            Self::Provincial => 60,
            Self::TransitCensus => 50,
            Self::CrowdSourced => 40,
            Self::Inferred => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authoritative => "authoritative",
            Self::MunicipalOpenData => "municipal_open_data",
            Self::HeritageRegistry => "heritage_registry",
            Self::Provincial => "provincial",
            Self::TransitCensus => "transit_census",
            Self::CrowdSourced => "crowd_sourced",
            Self::Inferred => "inferred",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One external data source of location facts.
///
/// `query` must never block indefinitely: the engine wraps every call in its
/// own deadline regardless. Providers are expected to fold their own
/// network/parse failures into a failed `ProviderResult`; returning `Err`
/// (or panicking) is tolerated and classified as FAILED by the engine.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique name, also the key in the merged payload map.
    fn name(&self) -> &str;

    /// Where this source sits in the authority hierarchy.
    fn source_type(&self) -> SourceType;

    /// Public link for provenance reporting.
    fn link(&self) -> &str {
        ""
    }

    /// Pure predicate: does this provider cover the given region? Evaluated
    /// before any network call.
    fn is_applicable(&self, region: &str) -> bool;

    async fn query(&self, lat: f64, lon: f64, ctx: &QueryContext) -> Result<ProviderResult, ProviderError>;
}

/// Provenance descriptor for a registered provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub source_type: SourceType,
    pub link: String,
}

/// Name-keyed provider registry. Registration order is irrelevant; all
/// lookups and orderings go through the priority table.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; a later registration under the same name wins.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<SourceDescriptor> {
        self.providers.get(name).map(|p| SourceDescriptor {
            name: p.name().to_string(),
            source_type: p.source_type(),
            link: p.link().to_string(),
        })
    }

    /// Merge priority for a name; unknown names rank as inferred data.
    pub fn priority(&self, name: &str) -> u32 {
        self.providers
            .get(name)
            .map(|p| p.source_type().priority())
            .unwrap_or(SourceType::Inferred.priority())
    }

    /// Providers covering the region, in name order.
    pub fn applicable(&self, region: &str) -> Vec<Arc<dyn Provider>> {
        self.providers
            .values()
            .filter(|p| p.is_applicable(region))
            .cloned()
            .collect()
    }

    /// All registered names sorted by (priority desc, name asc) — the walk
    /// order used by the merger.
    pub fn priority_order(&self) -> Vec<String> {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort_by(|a, b| self.priority(b).cmp(&self.priority(a)).then(a.cmp(b)));
        names.into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// A provider that serves a canned payload, optionally restricted to a set
/// of regions. Fills the role of a built-in offline dataset and doubles as
/// the fixture provider for the CLI demo and tests.
pub struct StaticProvider {
    name: String,
    source_type: SourceType,
    payload: Value,
    /// None = applicable everywhere. Matched case-insensitively.
    regions: Option<Vec<String>>,
    link: String,
}

impl StaticProvider {
    pub fn new(name: &str, source_type: SourceType, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            source_type,
            payload,
            regions: None,
            link: String::new(),
        }
    }

    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = Some(regions);
        self
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = link.to_string();
        self
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn link(&self) -> &str {
        &self.link
    }

    fn is_applicable(&self, region: &str) -> bool {
        match &self.regions {
            None => true,
            Some(regions) => regions.iter().any(|r| r.eq_ignore_ascii_case(region)),
        }
    }

    async fn query(&self, _lat: f64, _lon: f64, _ctx: &QueryContext) -> Result<ProviderResult, ProviderError> {
        Ok(ProviderResult::ok(&self.name, self.payload.clone()))
    }
}
