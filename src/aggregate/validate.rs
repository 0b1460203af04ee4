//! Completeness validation for a merged `LocationOverview`.
//!
//! Fields are classified required (×3), recommended (×2), or optional (×1),
//! each with a typed accessor — no string-path reflection. Null, empty
//! string/collection, and numeric zero all count as missing. That includes
//! 0.0 coordinates: (0,0) is the upstream sentinel for "not resolved", so a
//! legitimate equatorial/prime-meridian point is conflated with a failed
//! geocode. Known smell, kept for wire compatibility.

use crate::overview::LocationOverview;
use serde::{Deserialize, Serialize};

const WEIGHT_REQUIRED: u32 = 3;
const WEIGHT_RECOMMENDED: u32 = 2;
const WEIGHT_OPTIONAL: u32 = 1;

/// Validation outcome: hard violations, soft gaps, and a 0–100 score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// False whenever any required field is missing, regardless of score.
    pub valid: bool,
    pub missing_required: Vec<String>,
    pub missing_recommended: Vec<String>,
    /// Weighted percentage of populated fields.
    pub completeness_score: f64,
    /// Human-readable required-field violations. Never raised as errors —
    /// the caller decides whether to proceed, annotate, or abort.
    pub errors: Vec<String>,
}

struct FieldCheck {
    name: &'static str,
    weight: u32,
    present: fn(&LocationOverview) -> bool,
}

fn has_str(s: &str) -> bool {
    !s.trim().is_empty()
}

fn has_num(v: f64) -> bool {
    v != 0.0 && v.is_finite()
}

/// The full field classification. Order matters only for report readability.
const FIELD_CHECKS: &[FieldCheck] = &[
    // Required
    FieldCheck { name: "address", weight: WEIGHT_REQUIRED, present: |o| has_str(&o.identification.address) },
    FieldCheck { name: "municipality", weight: WEIGHT_REQUIRED, present: |o| has_str(&o.identification.municipality) },
    FieldCheck { name: "latitude", weight: WEIGHT_REQUIRED, present: |o| has_num(o.identification.latitude) },
    FieldCheck { name: "longitude", weight: WEIGHT_REQUIRED, present: |o| has_num(o.identification.longitude) },
    FieldCheck {
        name: "planning designation",
        weight: WEIGHT_REQUIRED,
        present: |o| has_str(&o.planning.zoning_designation) || has_str(&o.planning.official_plan_designation),
    },
    // Recommended
    FieldCheck {
        name: "neighbourhood",
        weight: WEIGHT_RECOMMENDED,
        present: |o| has_str(&o.identification.neighbourhood_id) || has_str(&o.identification.neighbourhood_name),
    },
    FieldCheck { name: "official plan designation", weight: WEIGHT_RECOMMENDED, present: |o| has_str(&o.planning.official_plan_designation) },
    FieldCheck { name: "transit summary", weight: WEIGHT_RECOMMENDED, present: |o| has_str(&o.neighbourhood.transit_summary) },
    FieldCheck { name: "amenities", weight: WEIGHT_RECOMMENDED, present: |o| !o.neighbourhood.amenities.is_empty() },
    FieldCheck { name: "region", weight: WEIGHT_RECOMMENDED, present: |o| has_str(&o.identification.region) },
    FieldCheck { name: "ward", weight: WEIGHT_RECOMMENDED, present: |o| has_str(&o.identification.ward) },
    // Optional — tracked for score purposes only
    FieldCheck { name: "postal code", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.identification.postal_code) },
    FieldCheck { name: "zoning description", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.planning.zoning_description) },
    FieldCheck { name: "secondary plan", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.planning.secondary_plan) },
    FieldCheck { name: "permitted uses", weight: WEIGHT_OPTIONAL, present: |o| !o.planning.permitted_uses.is_empty() },
    FieldCheck { name: "zoning overlays", weight: WEIGHT_OPTIONAL, present: |o| !o.planning.overlays.is_empty() },
    FieldCheck { name: "provincial plan", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.provincial.plan_designation) },
    FieldCheck { name: "overlay plans", weight: WEIGHT_OPTIONAL, present: |o| !o.provincial.overlay_plans.is_empty() },
    FieldCheck { name: "conservation authority", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.provincial.conservation_authority) },
    FieldCheck { name: "flood zone", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.environmental.flood_zone) },
    FieldCheck { name: "contaminated sites", weight: WEIGHT_OPTIONAL, present: |o| !o.environmental.contaminated_sites.is_empty() },
    FieldCheck { name: "heritage status", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.environmental.heritage_status) },
    FieldCheck { name: "soil class", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.environmental.soil_class) },
    FieldCheck { name: "average price", weight: WEIGHT_OPTIONAL, present: |o| has_num(o.market.average_price) },
    FieldCheck { name: "price trend", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.market.price_trend) },
    FieldCheck { name: "days on market", weight: WEIGHT_OPTIONAL, present: |o| has_num(o.market.days_on_market) },
    FieldCheck { name: "census population", weight: WEIGHT_OPTIONAL, present: |o| has_num(o.market.census_population) },
    FieldCheck { name: "median household income", weight: WEIGHT_OPTIONAL, present: |o| has_num(o.market.median_household_income) },
    FieldCheck { name: "road class", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.transport.road_class) },
    FieldCheck { name: "nearest highway", weight: WEIGHT_OPTIONAL, present: |o| has_str(&o.transport.nearest_highway) },
    FieldCheck { name: "highway distance", weight: WEIGHT_OPTIONAL, present: |o| has_num(o.transport.highway_distance_km) },
    FieldCheck { name: "transit stops", weight: WEIGHT_OPTIONAL, present: |o| !o.transport.transit_stops.is_empty() },
    FieldCheck { name: "walk score", weight: WEIGHT_OPTIONAL, present: |o| has_num(o.transport.walk_score) },
    FieldCheck {
        name: "surrounding uses",
        weight: WEIGHT_OPTIONAL,
        present: |o| o.neighbourhood.surrounding_uses.iter().any(|u| has_str(&u.land_use)),
    },
];

pub struct CompletenessValidator;

impl CompletenessValidator {
    /// Score the overview and flag missing required/recommended fields.
    ///
    /// `score = 100 × Σ(weight · present) / Σ(weight · total)`; any missing
    /// required field forces `valid = false` regardless of the score.
    pub fn validate(overview: &LocationOverview) -> ValidationReport {
        let mut missing_required = Vec::new();
        let mut missing_recommended = Vec::new();
        let mut achieved: u32 = 0;
        let mut possible: u32 = 0;

        for check in FIELD_CHECKS {
            possible += check.weight;
            if (check.present)(overview) {
                achieved += check.weight;
            } else {
                match check.weight {
                    WEIGHT_REQUIRED => missing_required.push(check.name.to_string()),
                    WEIGHT_RECOMMENDED => missing_recommended.push(check.name.to_string()),
                    _ => {}
                }
            }
        }

        let errors: Vec<String> = missing_required
            .iter()
            .map(|name| format!("missing required field: {}", name))
            .collect();

        ValidationReport {
            valid: missing_required.is_empty(),
            missing_required,
            missing_recommended,
            completeness_score: 100.0 * f64::from(achieved) / f64::from(possible),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overview::Amenity;

    fn minimal_valid() -> LocationOverview {
        let mut o = LocationOverview::default();
        o.identification.address = "55 Main St W".into();
        o.identification.municipality = "Hamilton".into();
        o.identification.latitude = 43.2557;
        o.identification.longitude = -79.8711;
        o.planning.zoning_designation = "D1".into();
        o
    }

    #[test]
    fn test_minimal_valid_passes() {
        let report = CompletenessValidator::validate(&minimal_valid());
        assert!(report.valid);
        assert!(report.missing_required.is_empty());
        assert!(report.errors.is_empty());
        assert!(!report.missing_recommended.is_empty());
        assert!(report.completeness_score > 0.0 && report.completeness_score < 100.0);
    }

    #[test]
    fn test_empty_overview_invalid() {
        let report = CompletenessValidator::validate(&LocationOverview::default());
        assert!(!report.valid);
        assert_eq!(report.missing_required.len(), 5);
        assert_eq!(report.completeness_score, 0.0);
        assert!(report.errors.iter().all(|e| e.starts_with("missing required field:")));
    }

    #[test]
    fn test_zero_latitude_is_a_violation() {
        let mut o = minimal_valid();
        o.identification.latitude = 0.0;
        let report = CompletenessValidator::validate(&o);
        assert!(!report.valid);
        assert!(report.missing_required.contains(&"latitude".to_string()));
    }

    #[test]
    fn test_official_plan_satisfies_planning_requirement() {
        let mut o = minimal_valid();
        o.planning.zoning_designation.clear();
        o.planning.official_plan_designation = "Downtown Mixed Use".into();
        let report = CompletenessValidator::validate(&o);
        assert!(report.valid);
    }

    #[test]
    fn test_required_violation_dominates_high_score() {
        // Populate everything recommended/optional but drop one required.
        let mut o = minimal_valid();
        o.identification.neighbourhood_name = "Durand".into();
        o.identification.region = "Golden Horseshoe".into();
        o.identification.ward = "Ward 2".into();
        o.neighbourhood.transit_summary = "Frequent bus service".into();
        o.neighbourhood.amenities.push(Amenity {
            name: "Gage Park".into(),
            category: "park".into(),
            distance_m: 400.0,
            lat: None,
            lon: None,
        });
        o.identification.address.clear();

        let report = CompletenessValidator::validate(&o);
        assert!(report.completeness_score > 30.0);
        assert!(!report.valid);
    }

    #[test]
    fn test_score_monotonic_when_field_populated() {
        let mut o = LocationOverview::default();
        let mut last = CompletenessValidator::validate(&o).completeness_score;

        o.identification.municipality = "Hamilton".into();
        let s = CompletenessValidator::validate(&o).completeness_score;
        assert!(s > last);
        last = s;

        o.identification.ward = "Ward 3".into();
        let s = CompletenessValidator::validate(&o).completeness_score;
        assert!(s > last);
        last = s;

        o.environmental.flood_zone = "outside regulated area".into();
        let s = CompletenessValidator::validate(&o).completeness_score;
        assert!(s > last);
    }

    #[test]
    fn test_every_merged_field_moves_the_score() {
        // Fields the merger can populate but that only matter for the
        // score: each must still nudge it upward when filled.
        let mut o = LocationOverview::default();
        let mut last = CompletenessValidator::validate(&o).completeness_score;

        o.environmental.contaminated_sites.push("former fuel depot".into());
        let s = CompletenessValidator::validate(&o).completeness_score;
        assert!(s > last);
        last = s;

        o.market.days_on_market = 21.0;
        let s = CompletenessValidator::validate(&o).completeness_score;
        assert!(s > last);
        last = s;

        o.transport.highway_distance_km = 2.4;
        let s = CompletenessValidator::validate(&o).completeness_score;
        assert!(s > last);
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut o = minimal_valid();
        o.identification.address = "   ".into();
        let report = CompletenessValidator::validate(&o);
        assert!(report.missing_required.contains(&"address".to_string()));
    }

    #[test]
    fn test_recommended_weighted_twice_optional() {
        // Filling one recommended field moves the score more than one
        // optional field does.
        let base = CompletenessValidator::validate(&LocationOverview::default()).completeness_score;

        let mut with_recommended = LocationOverview::default();
        with_recommended.identification.ward = "Ward 1".into();
        let r = CompletenessValidator::validate(&with_recommended).completeness_score;

        let mut with_optional = LocationOverview::default();
        with_optional.identification.postal_code = "L8P 1A1".into();
        let p = CompletenessValidator::validate(&with_optional).completeness_score;

        assert!(r - base > p - base);
    }
}
