//! The polling scheduler.
//!
//! One tokio task owns all mutable monitoring state: it fetches fresh
//! vehicle reports on a fixed interval, pushes them through the
//! geometric pipeline, and publishes an immutable [`Snapshot`] through
//! a watch channel. Consumers never observe intermediate state, and
//! the task is cancelled by the handle on teardown.

pub mod history;
pub mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use buswatch_transit::{
    average_speed_kmh, estimate, Route, RouteIdentifier, RouteIndex, Stop, VehicleDistance,
    VehicleReport,
};
use chrono::{DateTime, Utc};
use geo::Point;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TransitBackend};
use history::VehicleTrails;
use snapshot::{Snapshot, VehicleEstimate};

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// How often vehicle positions are refreshed.
    pub poll_interval: Duration,
    /// Reports older than this are flagged stale.
    pub stale_after: Duration,
    /// Maximum snap distance for the user's nearest route, in km.
    pub nearby_radius_km: f64,
    /// How many of the closest vehicles get full estimates.
    pub closest_count: usize,
    /// Positions retained per vehicle trail.
    pub trail_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            stale_after: Duration::from_secs(120),
            nearby_radius_km: 1.0,
            closest_count: 3,
            trail_capacity: 20,
        }
    }
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    snapshots: watch::Receiver<Arc<Snapshot>>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Subscribe to snapshot updates.
    pub fn snapshots(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Stop polling and wait for the task to finish.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

pub struct Monitor {
    backend: Arc<dyn TransitBackend>,
    config: MonitorConfig,

    // Fixed for the session once the index is loaded.
    nearby_routes: Vec<RouteIdentifier>,
    nearest_route: Option<Arc<Route>>,
    route_stops: Vec<Arc<Stop>>,
    nearest_stop: Option<Arc<Stop>>,

    // Mutable polling state, owned by the task.
    trails: VehicleTrails,
    tick: u64,
    snapshots: watch::Sender<Arc<Snapshot>>,
}

impl Monitor {
    /// Load routes and stops, locate the user's nearest route and stop,
    /// and start the polling task.
    pub async fn start(
        backend: Arc<dyn TransitBackend>,
        user_position: Point,
        config: MonitorConfig,
    ) -> Result<MonitorHandle, ApiError> {
        let index = load_index(backend.as_ref()).await?;
        info!(
            routes = index.all_routes().len(),
            stops = index.all_stops().len(),
            "transit data loaded"
        );

        let nearby_routes: Vec<RouteIdentifier> = index
            .routes_near(user_position, config.nearby_radius_km * 1000.0)
            .iter()
            .map(|r| r.id.clone())
            .collect();
        let nearest_route = estimate::nearest_route(&index, user_position, config.nearby_radius_km)
            .and_then(|id| index.get_route(&id).cloned());
        let route_stops = nearest_route
            .as_ref()
            .map(|r| index.stops_on(&r.id).to_vec())
            .unwrap_or_default();
        let nearest_stop = estimate::nearest_stop(&route_stops, user_position);

        let (tx, rx) = watch::channel(Arc::new(Snapshot::empty(Utc::now())));
        let shutdown = Arc::new(Notify::new());

        let trail_capacity = config.trail_capacity;
        let mut monitor = Monitor {
            backend,
            config,
            nearby_routes,
            nearest_route,
            route_stops,
            nearest_stop,
            trails: VehicleTrails::new(trail_capacity),
            tick: 0,
            snapshots: tx,
        };

        let signal = shutdown.clone();
        let task = tokio::spawn(async move { monitor.run(signal).await });

        Ok(MonitorHandle {
            snapshots: rx,
            shutdown,
            task,
        })
    }

    async fn run(&mut self, shutdown: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once().await {
                        warn!(%err, "poll failed, keeping previous snapshot");
                    }
                }
                _ = shutdown.notified() => {
                    debug!("monitor shutting down");
                    break;
                }
            }
        }
    }

    async fn poll_once(&mut self) -> Result<(), ApiError> {
        let reports = self.backend.vehicles().await?;
        self.trails.record(&reports);
        self.tick += 1;

        let now = Utc::now();
        let closest_vehicles = self.estimate_closest(&reports, now).await;

        let snapshot = Snapshot {
            tick: self.tick,
            generated_at: now,
            nearby_routes: self.nearby_routes.clone(),
            nearest_route: self.nearest_route.as_ref().map(|r| r.id.clone()),
            route_stops: self.route_stops.clone(),
            nearest_stop: self.nearest_stop.clone(),
            closest_vehicles,
            vehicles: reports,
        };

        self.snapshots.send_replace(Arc::new(snapshot));
        debug!(tick = self.tick, "snapshot published");
        Ok(())
    }

    /// Rank this tick's reports by route-relative distance from the
    /// user's stop and enrich the closest ones with predictions.
    async fn estimate_closest(
        &self,
        reports: &[VehicleReport],
        now: DateTime<Utc>,
    ) -> Vec<VehicleEstimate> {
        let (Some(route), Some(stop)) = (self.nearest_route.as_ref(), self.nearest_stop.as_ref())
        else {
            return Vec::new();
        };

        let mut distances = estimate::route_distances(route, stop, reports);
        distances.truncate(self.config.closest_count);

        let stale_after =
            chrono::Duration::from_std(self.config.stale_after).unwrap_or(chrono::Duration::MAX);

        let mut estimates = Vec::with_capacity(distances.len());
        for entry in distances {
            let VehicleDistance {
                vehicle,
                mut distance_km,
                segment,
            } = entry;

            // Travel time comes from the external prediction service;
            // without it the speed stays unknown.
            let (eta_minutes, speed_kmh) = match self.backend.prediction(&vehicle.id).await {
                Ok(prediction) => {
                    distance_km = prediction.distance_m / 1000.0;
                    let speed = average_speed_kmh(distance_km, prediction.eta_minutes);
                    (Some(prediction.eta_minutes), speed)
                }
                Err(err) => {
                    debug!(vehicle = %vehicle.id, %err, "no travel-time estimate");
                    (None, None)
                }
            };

            estimates.push(VehicleEstimate {
                stale: vehicle.is_stale(now, stale_after),
                trail: self.trails.positions_of(&vehicle.id),
                vehicle,
                distance_km,
                segment,
                eta_minutes,
                speed_kmh,
            });
        }
        estimates
    }
}

/// Fetch routes and their stops once, building the session index.
/// A route whose stops cannot be fetched still participates with an
/// empty stop list, like any other partially-populated route.
async fn load_index(backend: &dyn TransitBackend) -> Result<RouteIndex, ApiError> {
    let routes = backend.routes().await?;

    let mut stops = Vec::new();
    for route in &routes {
        match backend.stops(&route.id).await {
            Ok(mut route_stops) => stops.append(&mut route_stops),
            Err(err) => warn!(route = %route.id, %err, "no stops for route"),
        }
    }

    Ok(RouteIndex::from_data(routes, stops))
}
