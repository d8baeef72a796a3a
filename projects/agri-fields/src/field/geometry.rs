use crate::field::types::Coordinate;
use geo::Area;
use geo_types::{LineString, Polygon};

/// Length of one degree at the equator. Not latitude corrected.
pub const METERS_PER_DEGREE: f64 = 111_319.9;
const HECTARES_PER_SQUARE_METER: f64 = 0.0001;
const ACRES_PER_HECTARE: f64 = 2.47105;

/// Convert field vertices to a planar geo_types Polygon with x = lng, y = lat
fn to_geo_polygon(points: &[Coordinate]) -> Polygon<f64> {
    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.lng, p.lat)).collect();
    let ls = LineString::from(coords);
    Polygon::new(ls, vec![])
}

/// Shoelace area of the closed boundary, in square degrees
pub fn polygon_area_square_degrees(points: &[Coordinate]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    to_geo_polygon(points).unsigned_area()
}

/// Field size in acres using a flat-Earth degree-to-meter conversion.
/// Returns 0 for fewer than 3 points.
pub fn polygon_area_to_acres(points: &[Coordinate]) -> f64 {
    polygon_area_square_degrees(points)
        * METERS_PER_DEGREE.powi(2)
        * HECTARES_PER_SQUARE_METER
        * ACRES_PER_HECTARE
}
