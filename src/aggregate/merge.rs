//! Deterministic merge of per-provider payloads into one `LocationOverview`.
//!
//! Conflicts resolve by the static source-priority table: for every field
//! the merger walks the contributing providers in (priority desc, name asc)
//! order and takes the first non-empty value. The walk order never depends
//! on map insertion order or provider completion order, so re-merging the
//! same payload map always yields identical output. List fields are unioned
//! and capped instead of replaced.

use super::provider::ProviderRegistry;
use super::types::AggregationResult;
use crate::bearing::{self, UsePoint};
use crate::overview::{
    Amenity, DataSource, DirectionUse, LocationOverview,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeSet;

pub struct ResultMerger<'a> {
    registry: &'a ProviderRegistry,
    max_list_items: usize,
}

impl<'a> ResultMerger<'a> {
    pub fn new(registry: &'a ProviderRegistry, max_list_items: usize) -> Self {
        Self {
            registry,
            max_list_items: max_list_items.max(1),
        }
    }

    /// Merge one pass's successful payloads into a unified record.
    ///
    /// A provider absent from the map is treated exactly like one that
    /// returned an empty payload. The engine's warnings and errors are
    /// carried through so a zero-success pass still yields a (mostly empty)
    /// overview with a full trail.
    pub fn merge(&self, lat: f64, lon: f64, municipality: &str, aggregation: &AggregationResult) -> LocationOverview {
        let mut overview = LocationOverview {
            warnings: aggregation.warnings.clone(),
            errors: aggregation.errors.clone(),
            generated_at: Utc::now().to_rfc3339(),
            ..LocationOverview::default()
        };
        overview.identification.latitude = lat;
        overview.identification.longitude = lon;
        overview.identification.municipality = municipality.to_string();

        let mut picker = FieldPicker::new(self.registry, &aggregation.data);

        // Identification
        let ident = &mut overview.identification;
        ident.address = picker.str_field(&["address", "full_address"]);
        ident.region = picker.str_field(&["region", "county", "upper_tier"]);
        ident.postal_code = picker.str_field(&["postal_code", "postcode"]);
        ident.ward = picker.str_field(&["ward"]);
        ident.neighbourhood_id = picker.str_field(&["neighbourhood_id"]);
        ident.neighbourhood_name = picker.str_field(&["neighbourhood_name", "neighbourhood"]);

        // Planning
        let planning = &mut overview.planning;
        planning.zoning_designation = picker.str_field(&["zoning", "zoning_designation", "zone_code"]);
        planning.zoning_description = picker.str_field(&["zoning_description", "zone_description"]);
        planning.official_plan_designation = picker.str_field(&["official_plan", "official_plan_designation"]);
        planning.secondary_plan = picker.str_field(&["secondary_plan"]);
        planning.permitted_uses = picker.list_field(&["permitted_uses"], self.max_list_items);
        planning.overlays = picker.list_field(&["overlays", "zoning_overlays"], self.max_list_items);

        // Provincial / overlay plans
        let provincial = &mut overview.provincial;
        provincial.plan_designation = picker.str_field(&["provincial_plan", "growth_plan_designation"]);
        provincial.overlay_plans = picker.list_field(&["overlay_plans", "provincial_overlays"], self.max_list_items);
        provincial.conservation_authority = picker.str_field(&["conservation_authority"]);

        // Environmental
        let environmental = &mut overview.environmental;
        environmental.flood_zone = picker.str_field(&["flood_zone", "floodplain"]);
        environmental.heritage_status = picker.str_field(&["heritage_status", "heritage_designation"]);
        environmental.soil_class = picker.str_field(&["soil_class"]);
        environmental.contaminated_sites = picker.list_field(&["contaminated_sites", "brownfield_sites"], self.max_list_items);

        // Market
        let market = &mut overview.market;
        market.average_price = picker.f64_field(&["average_price", "avg_price"]);
        market.price_trend = picker.str_field(&["price_trend"]);
        market.days_on_market = picker.f64_field(&["days_on_market"]);
        market.census_population = picker.f64_field(&["population", "census_population"]);
        market.median_household_income = picker.f64_field(&["median_household_income", "median_income"]);

        // Transport
        let transport = &mut overview.transport;
        transport.road_class = picker.str_field(&["road_class"]);
        transport.nearest_highway = picker.str_field(&["nearest_highway"]);
        transport.highway_distance_km = picker.f64_field(&["highway_distance_km"]);
        transport.transit_stops = picker.list_field(&["transit_stops"], self.max_list_items);
        transport.walk_score = picker.f64_field(&["walk_score"]);

        // Neighbourhood: amenity union plus derived direction summary.
        let neighbourhood = &mut overview.neighbourhood;
        neighbourhood.transit_summary = picker.str_field(&["transit_summary", "transit"]);
        neighbourhood.amenities = picker.amenities(self.max_list_items);
        neighbourhood.surrounding_uses = derive_surrounding_uses(lat, lon, &neighbourhood.amenities);

        overview.sources = picker.into_sources();
        overview
    }
}

/// Compute the by-direction land-use summary from amenities that carry a
/// coordinate. Amenities without coordinates contribute nothing here.
fn derive_surrounding_uses(lat: f64, lon: f64, amenities: &[Amenity]) -> Vec<DirectionUse> {
    let points: Vec<UsePoint> = amenities
        .iter()
        .filter_map(|a| match (a.lat, a.lon) {
            (Some(p_lat), Some(p_lon)) => Some(UsePoint {
                lat: p_lat,
                lon: p_lon,
                category: a.category.clone(),
            }),
            _ => None,
        })
        .collect();

    bearing::summarize_directions(lat, lon, &points)
        .into_iter()
        .map(|s| DirectionUse {
            direction: s.direction.to_string(),
            land_use: s.land_use,
            description: s.description,
        })
        .collect()
}

// ─── Priority-ordered field extraction ──────────────────────────

/// Walks payloads in merge order and records which providers actually
/// contributed a field, so the provenance list covers every populated
/// sub-field.
struct FieldPicker<'a> {
    /// (name, payload) pairs sorted by (priority desc, name asc).
    sources: Vec<(&'a str, &'a Value)>,
    registry: &'a ProviderRegistry,
    contributors: BTreeSet<String>,
}

impl<'a> FieldPicker<'a> {
    fn new(registry: &'a ProviderRegistry, data: &'a std::collections::BTreeMap<String, Value>) -> Self {
        let mut sources: Vec<(&str, &Value)> = data.iter().map(|(k, v)| (k.as_str(), v)).collect();
        sources.sort_by(|a, b| {
            registry
                .priority(b.0)
                .cmp(&registry.priority(a.0))
                .then(a.0.cmp(b.0))
        });
        Self {
            sources,
            registry,
            contributors: BTreeSet::new(),
        }
    }

    /// First non-empty string under any of the given keys, highest priority
    /// source first. Empty string when nobody has it.
    fn str_field(&mut self, keys: &[&str]) -> String {
        for (name, payload) in &self.sources {
            if let Some(s) = get_str(payload, keys) {
                self.contributors.insert(name.to_string());
                return s;
            }
        }
        String::new()
    }

    /// First non-zero finite number under any of the given keys.
    fn f64_field(&mut self, keys: &[&str]) -> f64 {
        for (name, payload) in &self.sources {
            if let Some(v) = get_f64(payload, keys) {
                self.contributors.insert(name.to_string());
                return v;
            }
        }
        0.0
    }

    /// Union of string lists across all sources, priority order first,
    /// deduplicated, capped.
    fn list_field(&mut self, keys: &[&str], cap: usize) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (name, payload) in &self.sources {
            let items = get_str_list(payload, keys);
            if !items.is_empty() {
                self.contributors.insert(name.to_string());
            }
            for item in items {
                if out.len() >= cap {
                    return out;
                }
                if seen.insert(item.clone()) {
                    out.push(item);
                }
            }
        }
        out
    }

    /// Union of amenity lists across all sources, deduplicated by
    /// (name, category), sorted by distance then name, capped.
    fn amenities(&mut self, cap: usize) -> Vec<Amenity> {
        let mut seen = BTreeSet::new();
        let mut out: Vec<Amenity> = Vec::new();
        for (name, payload) in &self.sources {
            let Some(items) = payload.get("amenities").and_then(Value::as_array) else {
                continue;
            };
            let mut contributed = false;
            for item in items {
                let Ok(amenity) = serde_json::from_value::<Amenity>(item.clone()) else {
                    continue;
                };
                if amenity.name.trim().is_empty() {
                    continue;
                }
                if seen.insert((amenity.name.clone(), amenity.category.clone())) {
                    out.push(amenity);
                    contributed = true;
                }
            }
            if contributed {
                self.contributors.insert(name.to_string());
            }
        }
        out.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        out.truncate(cap);
        out
    }

    /// Provenance entries for every provider that contributed at least one
    /// field, in merge-priority order.
    fn into_sources(self) -> Vec<DataSource> {
        let mut out = Vec::new();
        for (name, payload) in &self.sources {
            if !self.contributors.contains(*name) {
                continue;
            }
            let descriptor = self.registry.descriptor(name);
            out.push(DataSource {
                name: name.to_string(),
                source_type: descriptor
                    .as_ref()
                    .map(|d| d.source_type.as_str().to_string())
                    .unwrap_or_else(|| "inferred".into()),
                last_updated: get_str(payload, &["last_updated", "updated_at"]).unwrap_or_default(),
                link: descriptor.map(|d| d.link).unwrap_or_default(),
            });
        }
        out
    }
}

// ─── Payload accessors ──────────────────────────────────────────
//
// Provider payloads are free-form JSON; these helpers apply the generic
// emptiness rules (missing key, null, "", 0, empty array all read as absent).

fn get_str(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = payload.get(key).and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn get_f64(payload: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        if let Some(v) = payload.get(key).and_then(Value::as_f64) {
            if v.is_finite() && v != 0.0 {
                return Some(v);
            }
        }
    }
    None
}

fn get_str_list(payload: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        if let Some(arr) = payload.get(key).and_then(Value::as_array) {
            let items: Vec<String> = arr
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !items.is_empty() {
                return items;
            }
        }
    }
    Vec::new()
}
