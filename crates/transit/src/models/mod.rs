//! Transit data models and error types.

pub mod types;

pub use types::{Result, Route, Stop, TransitError, VehicleReport};
