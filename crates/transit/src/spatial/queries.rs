//! Geodesic distance helpers.
//!
//! R-tree prefilters run on Euclidean degree distances; final results
//! are always verified with the haversine formula.

use geo::{ClosestPoint, HaversineDistance, Line, LineString, Point};

/// Haversine distance between two points, in meters.
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Haversine distance from a point to a line segment, in meters.
pub fn haversine_distance_to_line(point: Point, line: Line) -> f64 {
    let line_string = LineString::from(vec![line.start, line.end]);

    match line_string.closest_point(&point) {
        geo::Closest::Intersection(p) | geo::Closest::SinglePoint(p) => {
            haversine_distance(point, p)
        }
        geo::Closest::Indeterminate => f64::INFINITY,
    }
}

/// Meters to degrees at the equator. Used to size R-tree prefilter
/// radii; the prefilter is deliberately loose (a degree of longitude
/// shrinks away from the equator) and haversine checks trim the rest.
pub fn meters_to_degrees_approx(meters: f64) -> f64 {
    meters / 111_320.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_between_cities() {
        // San José to Ciudad Quesada is roughly 58 km.
        let san_jose = Point::new(-84.0907, 9.9281);
        let quesada = Point::new(-84.4295, 10.3236);

        let dist = haversine_distance(san_jose, quesada);
        assert!((dist - 58_000.0).abs() < 5_000.0);
    }

    #[test]
    fn distance_to_line_is_zero_on_the_line() {
        let point = Point::new(-84.0, 10.1);
        let line = Line::new(
            geo::Coord { x: -84.0, y: 10.0 },
            geo::Coord { x: -84.0, y: 10.2 },
        );

        assert!(haversine_distance_to_line(point, line) < 1.0);
    }

    #[test]
    fn degree_conversion_round_trips_the_equator_scale() {
        let deg = meters_to_degrees_approx(111_320.0);
        assert!((deg - 1.0).abs() < 1e-9);
    }
}
