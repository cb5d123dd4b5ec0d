//! # buswatch-core
//!
//! Service layer for the live transit monitor: the HTTP boundary to
//! the transport backend, and the polling scheduler that pushes fresh
//! vehicle reports through the geometric pipeline and publishes
//! immutable view-state snapshots.
//!
//! The geometry itself lives in [`buswatch_transit`], re-exported here
//! as [`transit`].

pub mod api;
pub mod monitor;

// Re-export the geometric core
pub use buswatch_transit as transit;

pub use api::{ApiError, HttpBackend, Prediction, TransitBackend};
pub use monitor::snapshot::{route_color, Snapshot, VehicleEstimate};
pub use monitor::{Monitor, MonitorConfig, MonitorHandle};
