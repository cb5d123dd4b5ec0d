//! Sub-path extraction between two snapped points.

use geo::{HaversineDistance, LineString, Point};

use super::snap::Snap;

/// Snaps closer together than this (in fraction space) coincide.
pub const COINCIDENT_EPSILON: f64 = 1e-9;

/// Extract the sub-path of `path` between two snaps on it.
///
/// The result always runs from the lower fractional position to the
/// higher one, regardless of argument order, and includes both snapped
/// endpoints. Coincident snaps yield a single-point sequence — the
/// "already there" outcome, not an error.
pub fn slice_between(path: &LineString, a: &Snap, b: &Snap) -> LineString {
    let (lo, hi) = if a.fraction <= b.fraction { (a, b) } else { (b, a) };

    if hi.fraction - lo.fraction < COINCIDENT_EPSILON {
        return LineString::new(vec![lo.point.into()]);
    }

    let total_length: f64 = path
        .lines()
        .map(|l| Point::from(l.start).haversine_distance(&Point::from(l.end)))
        .sum();

    let mut coords = vec![lo.point.into()];
    if total_length > 0.0 {
        // Walk interior vertices, keeping those strictly between the
        // two snap positions.
        let mut cumulative = 0.0;
        for segment in path.lines() {
            cumulative +=
                Point::from(segment.start).haversine_distance(&Point::from(segment.end));
            let fraction = cumulative / total_length;
            if fraction >= hi.fraction - COINCIDENT_EPSILON {
                break;
            }
            if fraction > lo.fraction + COINCIDENT_EPSILON {
                coords.push(segment.end);
            }
        }
    }
    coords.push(hi.point.into());

    LineString::new(coords)
}
