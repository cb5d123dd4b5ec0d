//! Geodesic length and implied-speed estimation.

use geo::{HaversineLength, LineString};

/// Total great-circle length of a coordinate sequence, in kilometers.
///
/// Sequences of one point or fewer measure 0.
pub fn length_km(path: &LineString) -> f64 {
    path.haversine_length() / 1000.0
}

/// Implied average speed in km/h for a distance covered in
/// `eta_minutes`.
///
/// Returns `None` when the travel-time estimate is zero, negative, or
/// not finite — the speed is unknown, never zero and never a division
/// by zero.
pub fn average_speed_kmh(distance_km: f64, eta_minutes: f64) -> Option<f64> {
    if !eta_minutes.is_finite() || eta_minutes <= 0.0 {
        return None;
    }
    Some(distance_km / (eta_minutes / 60.0))
}
