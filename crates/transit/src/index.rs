//! In-memory route index with spatial querying.
//!
//! Owns every validated route and stop for the lifetime of a map
//! session. Cheap to clone: all data sits behind `Arc`s, so handing a
//! copy to another task shares storage.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use geo::Point;
use rstar::RTree;

use crate::identifiers::{RouteIdentifier, StopIdentifier};
use crate::models::{Route, Stop};
use crate::spatial::index::{RouteSegmentNode, StopNode};
use crate::spatial::queries::{
    haversine_distance, haversine_distance_to_line, meters_to_degrees_approx,
};

#[derive(Clone)]
pub struct RouteIndex {
    routes: Vec<Arc<Route>>,
    stops: Vec<Arc<Stop>>,

    route_map: HashMap<RouteIdentifier, Arc<Route>>,
    stop_map: HashMap<StopIdentifier, Arc<Stop>>,
    stops_by_route: HashMap<RouteIdentifier, Vec<Arc<Stop>>>,

    stop_tree: RTree<StopNode>,
    route_tree: RTree<RouteSegmentNode>,
}

impl RouteIndex {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            stops: Vec::new(),
            route_map: HashMap::new(),
            stop_map: HashMap::new(),
            stops_by_route: HashMap::new(),
            stop_tree: RTree::new(),
            route_tree: RTree::new(),
        }
    }

    /// Build an index from validated routes and stops.
    pub fn from_data(routes: Vec<Route>, stops: Vec<Stop>) -> Self {
        let routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();
        let stops: Vec<Arc<Stop>> = stops.into_iter().map(Arc::new).collect();

        let route_map: HashMap<_, _> = routes.iter().map(|r| (r.id.clone(), r.clone())).collect();
        let stop_map: HashMap<_, _> = stops.iter().map(|s| (s.id.clone(), s.clone())).collect();

        let mut stops_by_route: HashMap<RouteIdentifier, Vec<Arc<Stop>>> = HashMap::new();
        for stop in &stops {
            stops_by_route
                .entry(stop.route_id.clone())
                .or_default()
                .push(stop.clone());
        }

        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .map(|s| StopNode::new(s.location, s.clone()))
                .collect(),
        );

        let mut route_segments = Vec::new();
        for route in &routes {
            for segment in route.path.lines() {
                route_segments.push(RouteSegmentNode::new(segment, route.clone()));
            }
        }
        let route_tree = RTree::bulk_load(route_segments);

        Self {
            routes,
            stops,
            route_map,
            stop_map,
            stops_by_route,
            stop_tree,
            route_tree,
        }
    }

    // ---- Lookups ----

    pub fn get_route(&self, id: &RouteIdentifier) -> Option<&Arc<Route>> {
        self.route_map.get(id)
    }

    pub fn get_stop(&self, id: &StopIdentifier) -> Option<&Arc<Stop>> {
        self.stop_map.get(id)
    }

    pub fn all_routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn all_stops(&self) -> &[Arc<Stop>] {
        &self.stops
    }

    /// Stops on a route, in load order. Empty for unknown routes.
    pub fn stops_on(&self, route: &RouteIdentifier) -> &[Arc<Stop>] {
        self.stops_by_route
            .get(route)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ---- Spatial queries ----

    /// Stops within `radius_m` meters of a point.
    pub fn stops_near(&self, point: Point, radius_m: f64) -> Vec<Arc<Stop>> {
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let limit = prefilter_degrees(radius_m);
        self.stop_tree
            .locate_within_distance([point.x(), point.y()], limit * limit)
            .filter(|node| haversine_distance(point, node.stop.location) <= radius_m)
            .map(|node| node.stop.clone())
            .collect()
    }

    /// Routes with any path segment within `radius_m` meters of a point.
    pub fn routes_near(&self, point: Point, radius_m: f64) -> Vec<Arc<Route>> {
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let limit = prefilter_degrees(radius_m);
        let mut seen = HashSet::new();
        self.route_tree
            .locate_within_distance([point.x(), point.y()], limit * limit)
            .filter(|node| haversine_distance_to_line(point, node.segment) <= radius_m)
            .filter(|node| seen.insert(node.route.id.clone()))
            .map(|node| node.route.clone())
            .collect()
    }

    /// The `n` stops nearest to a point, closest first.
    pub fn nearest_stops(&self, point: Point, n: usize) -> Vec<Arc<Stop>> {
        self.stop_tree
            .nearest_neighbor_iter(&[point.x(), point.y()])
            .take(n)
            .map(|node| node.stop.clone())
            .collect()
    }
}

impl Default for RouteIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Euclidean degree bound for the R-tree prefilter. Loose on purpose:
/// longitude degrees shrink away from the equator, so the bound is
/// doubled and the haversine check does the exact cut.
fn prefilter_degrees(radius_m: f64) -> f64 {
    meters_to_degrees_approx(radius_m) * 2.0
}
