//! The merged location record and its building blocks.
//!
//! `LocationOverview` is the unified, JSON-serializable output of one
//! aggregation pass. Empty strings, empty lists, and 0.0 mean "not populated";
//! the validator treats all three as missing.

use serde::{Deserialize, Serialize};

/// Identification block: address, coordinates, administrative boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentificationBlock {
    pub address: String,
    pub municipality: String,
    /// Upper-tier region or county.
    pub region: String,
    pub postal_code: String,
    /// 0.0 doubles as "coordinates not resolved" — see the validator.
    pub latitude: f64,
    pub longitude: f64,
    pub ward: String,
    pub neighbourhood_id: String,
    pub neighbourhood_name: String,
}

/// Municipal planning block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningBlock {
    pub zoning_designation: String,
    pub zoning_description: String,
    pub official_plan_designation: String,
    pub secondary_plan: String,
    pub permitted_uses: Vec<String>,
    pub overlays: Vec<String>,
}

/// Provincial / overlay-plan block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvincialBlock {
    pub plan_designation: String,
    pub overlay_plans: Vec<String>,
    pub conservation_authority: String,
}

/// A nearby amenity, optionally carrying its own coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub distance_m: f64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// One-line land-use summary for a compass direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionUse {
    pub direction: String,
    pub land_use: String,
    pub description: String,
}

/// Neighbourhood block: amenities, surrounding uses, transit narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighbourhoodBlock {
    pub amenities: Vec<Amenity>,
    pub surrounding_uses: Vec<DirectionUse>,
    pub transit_summary: String,
}

/// Environmental block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalBlock {
    pub flood_zone: String,
    pub heritage_status: String,
    pub soil_class: String,
    pub contaminated_sites: Vec<String>,
}

/// Market block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketBlock {
    pub average_price: f64,
    pub price_trend: String,
    pub days_on_market: f64,
    pub census_population: f64,
    pub median_household_income: f64,
}

/// Transport block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportBlock {
    pub road_class: String,
    pub nearest_highway: String,
    pub highway_distance_km: f64,
    pub transit_stops: Vec<String>,
    pub walk_score: f64,
}

/// Provenance entry: one external source that contributed to the overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub source_type: String,
    pub last_updated: String,
    pub link: String,
}

/// The unified record for one location.
///
/// Invariant: every populated sub-field is traceable to at least one entry
/// in `sources` — a field with data but no source is a merge bug.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationOverview {
    pub identification: IdentificationBlock,
    pub planning: PlanningBlock,
    pub provincial: ProvincialBlock,
    pub neighbourhood: NeighbourhoodBlock,
    pub environmental: EnvironmentalBlock,
    pub market: MarketBlock,
    pub transport: TransportBlock,
    pub sources: Vec<DataSource>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// ISO-8601 timestamp of the merge.
    pub generated_at: String,
}

impl LocationOverview {
    /// True when no provider contributed anything at all.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
