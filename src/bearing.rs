//! Great-circle bearing math and cardinal-direction bucketing.
//!
//! Used to derive the "surrounding use by direction" summary: each mapped
//! amenity is placed in one of 8 compass sectors by its bearing from the
//! origin point, and the majority land-use category per sector becomes a
//! one-line label.

use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;
const SECTOR_WIDTH: f64 = 45.0;

/// The 8 compass sectors, index 0 = N, clockwise.
pub const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Initial great-circle bearing from (lat1, lon1) to (lat2, lon2), in
/// degrees [0, 360).
pub fn initial_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1 * DEG;
    let phi2 = lat2 * DEG;
    let dlon = (lon2 - lon1) * DEG;

    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();

    normalize_degrees(y.atan2(x) / DEG)
}

fn normalize_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

/// Sector index for a bearing. N covers [337.5, 360) ∪ [0, 22.5).
pub fn sector_index(bearing: f64) -> usize {
    let b = normalize_degrees(bearing);
    (((b + SECTOR_WIDTH / 2.0) / SECTOR_WIDTH).floor() as usize) % 8
}

/// Land-use summary for one compass sector.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorSummary {
    pub direction: &'static str,
    pub land_use: String,
    pub description: String,
    pub sample_count: usize,
}

/// A point observation: coordinate plus its land-use category.
#[derive(Debug, Clone)]
pub struct UsePoint {
    pub lat: f64,
    pub lon: f64,
    pub category: String,
}

/// Bucket the given points into 8 sectors around the origin and summarize
/// the majority category per sector.
///
/// Sectors with no points borrow from their two adjacent sectors before
/// being marked "insufficient data". Ties resolve to the lexicographically
/// smallest category so the output is order-independent.
pub fn summarize_directions(origin_lat: f64, origin_lon: f64, points: &[UsePoint]) -> Vec<SectorSummary> {
    let mut buckets: [Vec<&str>; 8] = Default::default();

    for p in points {
        let bearing = initial_bearing(origin_lat, origin_lon, p.lat, p.lon);
        buckets[sector_index(bearing)].push(p.category.as_str());
    }

    let mut out = Vec::with_capacity(8);
    for (i, &direction) in DIRECTIONS.iter().enumerate() {
        if let Some((category, count)) = majority(&buckets[i]) {
            out.push(SectorSummary {
                direction,
                land_use: category.to_string(),
                description: format!("Predominantly {} ({} of {} mapped points)", category, count, buckets[i].len()),
                sample_count: buckets[i].len(),
            });
            continue;
        }

        // Empty sector: consult the two neighbours before giving up.
        let mut borrowed: Vec<&str> = Vec::new();
        borrowed.extend(&buckets[(i + 7) % 8]);
        borrowed.extend(&buckets[(i + 1) % 8]);
        match majority(&borrowed) {
            Some((category, _)) => out.push(SectorSummary {
                direction,
                land_use: category.to_string(),
                description: format!("Likely {} (inferred from adjacent sectors)", category),
                sample_count: 0,
            }),
            None => out.push(SectorSummary {
                direction,
                land_use: String::new(),
                description: "insufficient data".into(),
                sample_count: 0,
            }),
        }
    }
    out
}

/// Most frequent category; ties break to the smallest string.
fn majority<'a>(categories: &[&'a str]) -> Option<(&'a str, usize)> {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for c in categories {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts.into_iter().max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bearing_due_north() {
        let b = initial_bearing(43.0, -79.0, 44.0, -79.0);
        assert_relative_eq!(b, 0.0, epsilon = 0.5);
    }

    #[test]
    fn test_bearing_due_east() {
        let b = initial_bearing(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(b, 90.0, epsilon = 0.5);
    }

    #[test]
    fn test_bearing_southwest_quadrant() {
        let b = initial_bearing(44.0, -79.0, 43.0, -80.0);
        assert!(b > 180.0 && b < 270.0, "expected SW quadrant, got {}", b);
    }

    #[test]
    fn test_sector_north_wraps() {
        assert_eq!(DIRECTIONS[sector_index(10.0)], "N");
        assert_eq!(DIRECTIONS[sector_index(350.0)], "N");
        assert_eq!(DIRECTIONS[sector_index(337.5)], "N");
        assert_eq!(DIRECTIONS[sector_index(337.4)], "NW");
        assert_eq!(DIRECTIONS[sector_index(22.4)], "N");
        assert_eq!(DIRECTIONS[sector_index(22.5)], "NE");
    }

    #[test]
    fn test_sector_south_and_southwest_boundary() {
        // Sectors are centered on the cardinal bearings, so S covers
        // [157.5, 202.5) and SW starts at 202.5.
        assert_eq!(DIRECTIONS[sector_index(200.0)], "S");
        assert_eq!(DIRECTIONS[sector_index(202.5)], "SW");
        assert_eq!(DIRECTIONS[sector_index(225.0)], "SW");
        assert_eq!(DIRECTIONS[sector_index(247.4)], "SW");
        assert_eq!(DIRECTIONS[sector_index(247.5)], "W");
    }

    #[test]
    fn test_majority_tie_is_deterministic() {
        assert_eq!(majority(&["retail", "park", "park", "retail"]), Some(("park", 2)));
    }

    #[test]
    fn test_summarize_majority_per_sector() {
        // Two residential points north, one park northeast.
        let points = vec![
            UsePoint { lat: 43.01, lon: -79.0, category: "residential".into() },
            UsePoint { lat: 43.02, lon: -79.0, category: "residential".into() },
            UsePoint { lat: 43.01, lon: -78.99, category: "park".into() },
        ];
        let summary = summarize_directions(43.0, -79.0, &points);
        assert_eq!(summary.len(), 8);
        let north = summary.iter().find(|s| s.direction == "N").unwrap();
        assert_eq!(north.land_use, "residential");
        assert_eq!(north.sample_count, 2);
    }

    #[test]
    fn test_summarize_adjacent_fallback() {
        // Only a north point: NE and NW should borrow it, E should not.
        let points = vec![UsePoint { lat: 43.05, lon: -79.0, category: "industrial".into() }];
        let summary = summarize_directions(43.0, -79.0, &points);

        let ne = summary.iter().find(|s| s.direction == "NE").unwrap();
        assert_eq!(ne.land_use, "industrial");
        assert!(ne.description.contains("adjacent"));

        let south = summary.iter().find(|s| s.direction == "S").unwrap();
        assert_eq!(south.description, "insufficient data");
        assert!(south.land_use.is_empty());
    }

    #[test]
    fn test_summarize_no_points() {
        let summary = summarize_directions(43.0, -79.0, &[]);
        assert!(summary.iter().all(|s| s.description == "insufficient data"));
    }
}
