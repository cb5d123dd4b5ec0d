//! Bounded per-vehicle position trails.

use std::collections::{HashMap, VecDeque};

use buswatch_transit::{VehicleIdentifier, VehicleReport};
use geo::Point;

/// Recent positions of one vehicle, oldest first, at most `capacity`.
#[derive(Clone, Debug)]
pub struct Trail {
    points: VecDeque<Point>,
    capacity: usize,
}

impl Trail {
    fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, point: Point) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Trails for every vehicle seen this session. Owned by the polling
/// task; nothing else mutates it.
#[derive(Clone, Debug)]
pub struct VehicleTrails {
    trails: HashMap<VehicleIdentifier, Trail>,
    capacity: usize,
}

impl VehicleTrails {
    pub fn new(capacity: usize) -> Self {
        Self {
            trails: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append the position of every report to its vehicle's trail.
    pub fn record(&mut self, reports: &[VehicleReport]) {
        for report in reports {
            self.trails
                .entry(report.id.clone())
                .or_insert_with(|| Trail::new(self.capacity))
                .push(report.position);
        }
    }

    pub fn trail(&self, id: &VehicleIdentifier) -> Option<&Trail> {
        self.trails.get(id)
    }

    /// Trail positions as an owned list, empty for unseen vehicles.
    pub fn positions_of(&self, id: &VehicleIdentifier) -> Vec<Point> {
        self.trails
            .get(id)
            .map(|t| t.positions().collect())
            .unwrap_or_default()
    }
}
