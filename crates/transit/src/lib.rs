//! # buswatch-transit
//!
//! Geometric core for a live transit monitor: route geometries, stops
//! and polled vehicle positions in, route-relative distance and speed
//! estimates out.
//!
//! ## Design
//!
//! - **Validated at the boundary**: model constructors reject malformed
//!   coordinates and degenerate paths, so the pipeline itself is total.
//! - **Pure pipeline**: snap → slice → measure → implied speed, every
//!   stage a deterministic function over immutable inputs.
//! - **Spatial queries**: R-tree indices over stops and route segments,
//!   Euclidean prefilter plus haversine verification.
//!
//! ## Example
//!
//! ```
//! use buswatch_transit::prelude::*;
//! use geo::{line_string, Point};
//!
//! let route = Route::new(
//!     RouteIdentifier::new("1"),
//!     "Centro",
//!     line_string![
//!         (x: -84.40, y: 10.34),
//!         (x: -84.45, y: 10.36),
//!         (x: -84.50, y: 10.36),
//!     ],
//! )
//! .unwrap();
//!
//! let index = RouteIndex::from_data(vec![route], vec![]);
//!
//! // The user is standing a few hundred meters off the path.
//! let user = Point::new(-84.43, 10.35);
//! let nearest = nearest_route(&index, user, 1.0);
//! assert_eq!(nearest, Some(RouteIdentifier::new("1")));
//! ```

pub mod estimate;
pub mod geometry;
pub mod identifiers;
pub mod index;
pub mod models;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::estimate::{
        is_nearby, nearest_route, nearest_stop, route_distances, VehicleDistance,
    };
    pub use crate::geometry::{average_speed_kmh, length_km, slice_between, snap_to_path, Snap};
    pub use crate::identifiers::{RouteIdentifier, StopIdentifier, VehicleIdentifier};
    pub use crate::index::RouteIndex;
    pub use crate::models::{Result, Route, Stop, TransitError, VehicleReport};
}

pub use prelude::*;
