//! Estimation queries over validated transit data.
//!
//! These are the pure entry points the presentation layer calls: which
//! route is nearest to the user, which of its stops is closest, and how
//! far along the route each vehicle is from that stop. All of them are
//! deterministic over their inputs and do no I/O.

use std::sync::Arc;

use geo::{LineString, Point};

use crate::geometry::{length_km, slice_between, snap_to_path};
use crate::identifiers::RouteIdentifier;
use crate::index::RouteIndex;
use crate::models::{Route, Stop, VehicleReport};
use crate::spatial::queries::haversine_distance;

/// A vehicle's route-relative distance from a reference stop.
#[derive(Clone, Debug)]
pub struct VehicleDistance {
    pub vehicle: VehicleReport,
    /// Geodesic length of the route sub-path between stop and vehicle.
    pub distance_km: f64,
    /// That sub-path, for display.
    pub segment: LineString,
}

/// The route whose path comes nearest to `point`.
///
/// `None` when no route comes within `threshold_km` — a normal
/// "no match" outcome, not an error.
pub fn nearest_route(
    index: &RouteIndex,
    point: Point,
    threshold_km: f64,
) -> Option<RouteIdentifier> {
    let mut best: Option<(f64, &Arc<Route>)> = None;
    for route in index.all_routes() {
        let snap = snap_to_path(&route.path, point);
        if best.map_or(true, |(d, _)| snap.distance_m < d) {
            best = Some((snap.distance_m, route));
        }
    }
    best.filter(|(distance_m, _)| *distance_m <= threshold_km * 1000.0)
        .map(|(_, route)| route.id.clone())
}

/// The stop closest to `point` by straight-line distance.
pub fn nearest_stop(stops: &[Arc<Stop>], point: Point) -> Option<Arc<Stop>> {
    stops
        .iter()
        .map(|stop| (haversine_distance(point, stop.location), stop))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, stop)| stop.clone())
}

/// Whether a path passes within `max_km` of a point.
pub fn is_nearby(path: &LineString, point: Point, max_km: f64) -> bool {
    snap_to_path(path, point).distance_m <= max_km * 1000.0
}

/// Route-relative distances from `stop` for every vehicle reported on
/// `route`, closest first.
///
/// Both the stop and each vehicle are snapped onto the route path; the
/// distance is the geodesic length of the sub-path between the two
/// snaps, not the straight line.
pub fn route_distances(
    route: &Route,
    stop: &Stop,
    vehicles: &[VehicleReport],
) -> Vec<VehicleDistance> {
    let stop_snap = snap_to_path(&route.path, stop.location);

    let mut distances: Vec<VehicleDistance> = vehicles
        .iter()
        .filter(|v| v.route_id == route.id)
        .map(|vehicle| {
            let vehicle_snap = snap_to_path(&route.path, vehicle.position);
            let segment = slice_between(&route.path, &stop_snap, &vehicle_snap);
            VehicleDistance {
                vehicle: vehicle.clone(),
                distance_km: length_km(&segment),
                segment,
            }
        })
        .collect();

    distances.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{StopIdentifier, VehicleIdentifier};
    use approx::assert_relative_eq;
    use geo::line_string;

    fn centro() -> Route {
        Route::new(
            RouteIdentifier::new("1"),
            "Centro",
            line_string![
                (x: -84.40, y: 10.34),
                (x: -84.45, y: 10.36),
                (x: -84.50, y: 10.36),
            ],
        )
        .unwrap()
    }

    fn rural() -> Route {
        Route::new(
            RouteIdentifier::new("2"),
            "Rural",
            line_string![(x: -84.20, y: 10.50), (x: -84.25, y: 10.55)],
        )
        .unwrap()
    }

    fn stop_at(lon: f64, lat: f64) -> Stop {
        Stop::new(
            StopIdentifier::new("s1"),
            "Parque",
            RouteIdentifier::new("1"),
            Point::new(lon, lat),
        )
        .unwrap()
    }

    fn vehicle_on(route: &str, id: &str, lon: f64, lat: f64) -> VehicleReport {
        VehicleReport::new(
            VehicleIdentifier::new(id),
            RouteIdentifier::new(route),
            Point::new(lon, lat),
            None,
            "SJB-000",
            "bus",
            "activo",
        )
        .unwrap()
    }

    #[test]
    fn nearest_route_picks_the_closest_path() {
        let index = RouteIndex::from_data(vec![centro(), rural()], vec![]);

        let found = nearest_route(&index, Point::new(-84.43, 10.35), 5.0);
        assert_eq!(found, Some(RouteIdentifier::new("1")));
    }

    #[test]
    fn nearest_route_beyond_threshold_is_no_match() {
        let index = RouteIndex::from_data(vec![centro(), rural()], vec![]);

        // ~30 km from both routes.
        let found = nearest_route(&index, Point::new(-84.10, 10.10), 1.0);
        assert_eq!(found, None);
    }

    #[test]
    fn nearest_route_on_empty_index_is_no_match() {
        let index = RouteIndex::new();
        assert_eq!(nearest_route(&index, Point::new(-84.43, 10.35), 5.0), None);
    }

    #[test]
    fn nearest_stop_by_straight_line() {
        let stops = vec![
            Arc::new(stop_at(-84.41, 10.345)),
            Arc::new(
                Stop::new(
                    StopIdentifier::new("s2"),
                    "Mercado",
                    RouteIdentifier::new("1"),
                    Point::new(-84.46, 10.36),
                )
                .unwrap(),
            ),
        ];

        let found = nearest_stop(&stops, Point::new(-84.412, 10.346)).unwrap();
        assert_eq!(found.id, StopIdentifier::new("s1"));

        assert!(nearest_stop(&[], Point::new(-84.41, 10.345)).is_none());
    }

    #[test]
    fn nearby_within_a_kilometer() {
        let route = centro();

        assert!(is_nearby(&route.path, Point::new(-84.43, 10.352), 1.0));
        assert!(!is_nearby(&route.path, Point::new(-84.43, 10.50), 1.0));
    }

    #[test]
    fn route_distances_sorted_and_filtered() {
        let route = centro();
        let stop = stop_at(-84.41, 10.345);
        let vehicles = vec![
            vehicle_on("1", "far", -84.49, 10.36),
            vehicle_on("1", "near", -84.43, 10.352),
            vehicle_on("2", "other-route", -84.22, 10.52),
        ];

        let distances = route_distances(&route, &stop, &vehicles);

        assert_eq!(distances.len(), 2);
        assert_eq!(distances[0].vehicle.id, VehicleIdentifier::new("near"));
        assert_eq!(distances[1].vehicle.id, VehicleIdentifier::new("far"));
        assert!(distances[0].distance_km < distances[1].distance_km);
    }

    #[test]
    fn vehicle_at_the_stop_measures_zero() {
        let route = centro();
        let stop = stop_at(-84.43, 10.352);
        let vehicles = vec![vehicle_on("1", "here", -84.43, 10.352)];

        let distances = route_distances(&route, &stop, &vehicles);
        assert_relative_eq!(distances[0].distance_km, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn segment_runs_between_the_two_snaps() {
        let route = centro();
        let stop = stop_at(-84.41, 10.345);
        let vehicles = vec![vehicle_on("1", "v", -84.48, 10.36)];

        let distances = route_distances(&route, &stop, &vehicles);
        let segment = &distances[0].segment;

        // Spans the middle vertex of the path.
        assert!(segment.0.len() >= 3);
        assert!(segment.0.iter().any(|c| c.x == -84.45 && c.y == 10.36));
        assert_relative_eq!(
            length_km(segment),
            distances[0].distance_km,
            epsilon = 1e-12
        );
    }
}
