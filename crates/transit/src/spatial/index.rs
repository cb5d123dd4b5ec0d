//! R-tree nodes for spatial indexing.
//!
//! Stops are indexed as points, routes as their individual path
//! segments. Queries prefilter on Euclidean degree distance inside the
//! tree and verify candidates with haversine distance afterwards.

use std::sync::Arc;

use geo::{Line, Point};
use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::{Route, Stop};

// ============================================================================
// Stop Spatial Node
// ============================================================================

#[derive(Clone)]
pub struct StopNode {
    pub stop: Arc<Stop>,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(location: Point, stop: Arc<Stop>) -> Self {
        Self {
            stop,
            point: [location.x(), location.y()],
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ============================================================================
// Route Segment Spatial Node
// ============================================================================

#[derive(Clone)]
pub struct RouteSegmentNode {
    pub route: Arc<Route>,
    pub segment: Line,
    aabb: AABB<[f64; 2]>,
}

impl RouteSegmentNode {
    pub fn new(segment: Line, route: Arc<Route>) -> Self {
        let start = [segment.start.x, segment.start.y];
        let end = [segment.end.x, segment.end.y];

        Self {
            route,
            segment,
            aabb: AABB::from_corners(start, end),
        }
    }
}

impl RTreeObject for RouteSegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for RouteSegmentNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        // Squared Euclidean distance from the point to the segment.
        let a = [self.segment.start.x, self.segment.start.y];
        let b = [self.segment.end.x, self.segment.end.y];

        let ab = [b[0] - a[0], b[1] - a[1]];
        let ap = [point[0] - a[0], point[1] - a[1]];

        let ab_ab = ab[0] * ab[0] + ab[1] * ab[1];
        if ab_ab == 0.0 {
            // Segment collapsed to a point.
            return ap[0] * ap[0] + ap[1] * ap[1];
        }

        let t = ((ab[0] * ap[0] + ab[1] * ap[1]) / ab_ab).clamp(0.0, 1.0);
        let closest = [a[0] + t * ab[0], a[1] + t * ab[1]];

        let dx = point[0] - closest[0];
        let dy = point[1] - closest[1];
        dx * dx + dy * dy
    }
}
