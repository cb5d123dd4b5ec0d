//! Snap-to-route: project an arbitrary point onto the nearest location
//! along a path.
//!
//! Candidate points are found by clamped projection in degree space,
//! segment by segment, and scored by haversine distance. The fractional
//! position is length-weighted: a snap halfway along a short first
//! segment of a long path sits near 0, not near 0.5.

use geo::{HaversineDistance, Line, LineString, Point};

/// A point guaranteed to lie on a path.
#[derive(Clone, Copy, Debug)]
pub struct Snap {
    /// The snapped coordinate on the path.
    pub point: Point,
    /// Length-weighted position along the path, 0 = start, 1 = end.
    pub fraction: f64,
    /// Haversine distance from the query point to `point`, in meters.
    pub distance_m: f64,
}

/// Project `query` onto the nearest location along `path`.
///
/// Total for any non-empty path. When two segments are equidistant the
/// earlier one in path order wins, so the lowest fractional position is
/// returned. Zero-length segments (repeated consecutive coordinates)
/// contribute their start point as a candidate and cannot divide by
/// zero.
pub fn snap_to_path(path: &LineString, query: Point) -> Snap {
    let first = Point::from(path.0[0]);
    if path.0.len() < 2 {
        return Snap {
            point: first,
            fraction: 0.0,
            distance_m: query.haversine_distance(&first),
        };
    }

    let mut best_point = first;
    let mut best_distance = f64::INFINITY;
    let mut best_prefix = 0.0;
    let mut length_before = 0.0;

    for segment in path.lines() {
        let start = Point::from(segment.start);
        let end = Point::from(segment.end);
        let segment_length = start.haversine_distance(&end);

        let (candidate, t) = project_onto_segment(query, segment);
        let distance = query.haversine_distance(&candidate);
        // Strictly closer only: ties keep the earlier segment.
        if distance < best_distance {
            best_point = candidate;
            best_distance = distance;
            best_prefix = length_before + t * segment_length;
        }

        length_before += segment_length;
    }

    let total_length = length_before;
    let fraction = if total_length > 0.0 {
        (best_prefix / total_length).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Snap {
        point: best_point,
        fraction,
        distance_m: best_distance,
    }
}

/// Closest point on a single segment, with the clamped projection
/// parameter t in [0, 1]. A zero-length segment yields its start point
/// at t = 0.
fn project_onto_segment(point: Point, segment: Line) -> (Point, f64) {
    let (ax, ay) = (segment.start.x, segment.start.y);
    let (dx, dy) = (segment.end.x - ax, segment.end.y - ay);

    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return (Point::new(ax, ay), 0.0);
    }

    let t = (((point.x() - ax) * dx + (point.y() - ay) * dy) / length_sq).clamp(0.0, 1.0);
    (Point::new(ax + t * dx, ay + t * dy), t)
}
