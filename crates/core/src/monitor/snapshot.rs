//! Immutable view-state snapshots.
//!
//! The polling task publishes one `Snapshot` per tick; consumers only
//! ever see a complete, self-consistent value. Nothing here is
//! mutated after publication.

use std::sync::Arc;

use buswatch_transit::{RouteIdentifier, Stop, VehicleReport};
use chrono::{DateTime, Utc};
use geo::{LineString, Point};

/// One vehicle's estimate relative to the user's stop.
#[derive(Clone, Debug)]
pub struct VehicleEstimate {
    pub vehicle: VehicleReport,
    /// Route-relative distance between the stop and the vehicle, in km.
    /// Overridden by the prediction service's figure when available.
    pub distance_km: f64,
    /// The route sub-path between the stop and the vehicle, for display.
    pub segment: LineString,
    /// Travel-time estimate in minutes, when the prediction service
    /// answered.
    pub eta_minutes: Option<f64>,
    /// Implied average speed in km/h; unknown without an ETA.
    pub speed_kmh: Option<f64>,
    /// The report's timestamp is older than the configured threshold.
    pub stale: bool,
    /// Recent positions of this vehicle, oldest first.
    pub trail: Vec<Point>,
}

/// Everything the presentation layer needs for one poll tick.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Poll cycle counter, starting at 1. The initial placeholder
    /// snapshot is tick 0.
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    /// Every vehicle reported this tick.
    pub vehicles: Vec<VehicleReport>,
    /// Routes passing within the configured radius of the user.
    pub nearby_routes: Vec<RouteIdentifier>,
    /// The route nearest to the user, if any is within the radius.
    pub nearest_route: Option<RouteIdentifier>,
    /// Stops of the nearest route.
    pub route_stops: Vec<Arc<Stop>>,
    /// The closest of those stops to the user.
    pub nearest_stop: Option<Arc<Stop>>,
    /// Top vehicles by route-relative distance from the nearest stop.
    pub closest_vehicles: Vec<VehicleEstimate>,
}

impl Snapshot {
    /// Placeholder published before the first poll completes.
    pub(crate) fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            tick: 0,
            generated_at,
            vehicles: Vec::new(),
            nearby_routes: Vec::new(),
            nearest_route: None,
            route_stops: Vec::new(),
            nearest_stop: None,
            closest_vehicles: Vec::new(),
        }
    }
}

/// Stable display color for a route.
///
/// Numeric route ids walk a fixed palette; anything else gets the
/// fallback amber.
pub fn route_color(id: &RouteIdentifier) -> &'static str {
    const PALETTE: [&str; 3] = ["#1abc9c", "#e67e22", "#3498db"];

    match id.as_str().parse::<usize>() {
        Ok(n) if n >= 1 => PALETTE[(n - 1) % PALETTE.len()],
        _ => "#ffb400",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_stable_and_cycles() {
        assert_eq!(route_color(&RouteIdentifier::new("1")), "#1abc9c");
        assert_eq!(route_color(&RouteIdentifier::new("2")), "#e67e22");
        assert_eq!(route_color(&RouteIdentifier::new("3")), "#3498db");
        assert_eq!(route_color(&RouteIdentifier::new("4")), "#1abc9c");
    }

    #[test]
    fn non_numeric_ids_get_the_fallback() {
        assert_eq!(route_color(&RouteIdentifier::new("express")), "#ffb400");
        assert_eq!(route_color(&RouteIdentifier::new("0")), "#ffb400");
    }

    #[test]
    fn empty_snapshot_is_tick_zero() {
        let snapshot = Snapshot::empty(Utc::now());
        assert_eq!(snapshot.tick, 0);
        assert!(snapshot.vehicles.is_empty());
        assert!(snapshot.nearest_route.is_none());
    }
}
