//! Core data types for routes, stops, and vehicle reports.
//!
//! All constructors validate their geometric inputs. A value of one of
//! these types is therefore always well-formed: coordinates are finite
//! and inside WGS84 bounds, and route paths carry at least two points.
//! Downstream geometry never has to re-check.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use geo::{LineString, Point};

use crate::identifiers::*;

// ============================================================================
// Validation
// ============================================================================

/// Check a WGS84 coordinate: finite, lon in [-180, 180], lat in [-90, 90].
pub fn validate_coordinate(point: Point) -> Result<Point> {
    let (lon, lat) = (point.x(), point.y());
    let valid = lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat);
    if !valid {
        return Err(TransitError::InvalidCoordinate { lon, lat });
    }
    Ok(point)
}

fn validate_path(path: LineString) -> Result<LineString> {
    if path.0.len() < 2 {
        return Err(TransitError::DegeneratePath(path.0.len()));
    }
    for coord in &path.0 {
        validate_coordinate(Point::from(*coord))?;
    }
    Ok(path)
}

// ============================================================================
// Data Structures
// ============================================================================

/// A transit route with its travel-line geometry.
///
/// The path is immutable once loaded and lives for the map session.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteIdentifier,
    pub name: Arc<str>,
    pub path: LineString,
}

impl Route {
    pub fn new(id: RouteIdentifier, name: impl AsRef<str>, path: LineString) -> Result<Self> {
        Ok(Self {
            id,
            name: name.as_ref().into(),
            path: validate_path(path)?,
        })
    }
}

/// A stop on a route: a named boarding point.
#[derive(Clone, Debug)]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    pub route_id: RouteIdentifier,
    pub location: Point,
}

impl Stop {
    pub fn new(
        id: StopIdentifier,
        name: impl AsRef<str>,
        route_id: RouteIdentifier,
        location: Point,
    ) -> Result<Self> {
        Ok(Self {
            id,
            name: name.as_ref().into(),
            route_id,
            location: validate_coordinate(location)?,
        })
    }
}

/// A single polled vehicle position.
///
/// Reports are replaced wholesale on every poll cycle; `recorded_at` is
/// the backend's last-update time and may be absent.
#[derive(Clone, Debug)]
pub struct VehicleReport {
    pub id: VehicleIdentifier,
    pub route_id: RouteIdentifier,
    pub position: Point,
    pub recorded_at: Option<DateTime<Utc>>,
    pub plate: Arc<str>,
    pub kind: Arc<str>,
    pub status: Arc<str>,
}

impl VehicleReport {
    pub fn new(
        id: VehicleIdentifier,
        route_id: RouteIdentifier,
        position: Point,
        recorded_at: Option<DateTime<Utc>>,
        plate: impl AsRef<str>,
        kind: impl AsRef<str>,
        status: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            id,
            route_id,
            position: validate_coordinate(position)?,
            recorded_at,
            plate: plate.as_ref().into(),
            kind: kind.as_ref().into(),
            status: status.as_ref().into(),
        })
    }

    /// A report is stale when its timestamp is older than `max_age`.
    /// Reports without a timestamp are not considered stale.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.recorded_at
            .map_or(false, |t| now.signed_duration_since(t) > max_age)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("route not found: {0}")]
    RouteNotFound(RouteIdentifier),

    #[error("stop not found: {0}")]
    StopNotFound(StopIdentifier),

    #[error("coordinate out of range: ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },

    #[error("route path needs at least 2 points, got {0}")]
    DegeneratePath(usize),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn route_requires_two_points() {
        let err = Route::new(
            RouteIdentifier::new("1"),
            "Centro",
            line_string![(x: -84.4, y: 10.34)],
        )
        .unwrap_err();
        assert!(matches!(err, TransitError::DegeneratePath(1)));
    }

    #[test]
    fn route_rejects_bad_coordinates() {
        let nan = Route::new(
            RouteIdentifier::new("1"),
            "Centro",
            line_string![(x: f64::NAN, y: 10.34), (x: -84.45, y: 10.36)],
        );
        assert!(nan.is_err());

        let out_of_range = Route::new(
            RouteIdentifier::new("1"),
            "Centro",
            line_string![(x: -184.4, y: 10.34), (x: -84.45, y: 10.36)],
        );
        assert!(out_of_range.is_err());
    }

    #[test]
    fn stop_validates_location() {
        assert!(Stop::new(
            StopIdentifier::new("s1"),
            "Parque",
            RouteIdentifier::new("1"),
            Point::new(-84.43, 10.35),
        )
        .is_ok());

        assert!(Stop::new(
            StopIdentifier::new("s2"),
            "Nowhere",
            RouteIdentifier::new("1"),
            Point::new(-84.43, 99.0),
        )
        .is_err());
    }

    #[test]
    fn staleness() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let report = VehicleReport::new(
            VehicleIdentifier::new("v1"),
            RouteIdentifier::new("1"),
            Point::new(-84.43, 10.35),
            Some(now - Duration::seconds(300)),
            "SJB-123",
            "bus",
            "activo",
        )
        .unwrap();

        assert!(report.is_stale(now, Duration::seconds(120)));
        assert!(!report.is_stale(now, Duration::seconds(600)));

        let no_timestamp = VehicleReport::new(
            VehicleIdentifier::new("v2"),
            RouteIdentifier::new("1"),
            Point::new(-84.43, 10.35),
            None,
            "SJB-124",
            "bus",
            "activo",
        )
        .unwrap();
        assert!(!no_timestamp.is_stale(now, Duration::seconds(120)));
    }
}
