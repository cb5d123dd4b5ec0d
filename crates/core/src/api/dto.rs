//! Wire DTOs for the transport backend.
//!
//! Field names mirror the backend's JSON exactly; everything is
//! converted into canonical, validated models right here and nowhere
//! else. The wire is latitude/longitude-ambivalent (WKT carries
//! lon-lat, vehicle rows carry `lat`/`lng` fields); internally only
//! (lon, lat) `geo::Point`s exist.

use buswatch_transit::{
    Route, RouteIdentifier, Stop, StopIdentifier, VehicleIdentifier, VehicleReport,
};
use chrono::{DateTime, Utc};
use geo::Point;
use serde::Deserialize;

use super::{wkt, ApiError};

// ============================================================================
// Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RouteRow {
    pub id_ruta: i64,
    pub nombre: String,
    pub geom: String,
}

impl RouteRow {
    pub fn into_route(self) -> Result<Route, ApiError> {
        let path = wkt::parse_linestring(&self.geom)?;
        let route = Route::new(RouteIdentifier::new(self.id_ruta.to_string()), &self.nombre, path)?;
        Ok(route)
    }
}

// ============================================================================
// Stops
// ============================================================================

/// Stop rows are inconsistent across backend versions: the id may be
/// `id_parada` or `id`, and the geometry may be EWKT text or a GeoJSON
/// object.
#[derive(Debug, Deserialize)]
pub struct StopRow {
    #[serde(default)]
    pub id_parada: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub geom: Option<serde_json::Value>,
}

impl StopRow {
    pub fn into_stop(self, route: &RouteIdentifier) -> Result<Stop, ApiError> {
        let id = self
            .id_parada
            .or(self.id)
            .ok_or_else(|| ApiError::Payload("stop row without id_parada or id".into()))?;

        let location = match self.geom {
            Some(serde_json::Value::String(text)) => wkt::parse_point(&text)?,
            Some(value) => geojson_point(value)?,
            None => return Err(ApiError::Payload("stop row without geometry".into())),
        };

        let stop = Stop::new(
            StopIdentifier::new(id.to_string()),
            &self.nombre,
            route.clone(),
            location,
        )?;
        Ok(stop)
    }
}

fn geojson_point(value: serde_json::Value) -> Result<Point, ApiError> {
    let geometry: geojson::Geometry =
        serde_json::from_value(value).map_err(|e| ApiError::Geometry(e.to_string()))?;
    match geometry.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => Ok(Point::new(coords[0], coords[1])),
        _ => Err(ApiError::Geometry("stop geometry is not a point".into())),
    }
}

// ============================================================================
// Vehicles
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VehicleRow {
    pub id: i64,
    pub placa: String,
    pub tipo: String,
    pub estado: String,
    #[serde(rename = "routeId")]
    pub route_id: i64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub timestamp: Option<String>,
}

impl VehicleRow {
    /// `Ok(None)` when the backend has no position for the vehicle yet;
    /// a report with a made-up coordinate would poison every estimate
    /// downstream.
    pub fn into_report(self) -> Result<Option<VehicleReport>, ApiError> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Ok(None);
        };

        let recorded_at = self.timestamp.as_deref().and_then(parse_timestamp);
        let report = VehicleReport::new(
            VehicleIdentifier::new(self.id.to_string()),
            RouteIdentifier::new(self.route_id.to_string()),
            Point::new(lng, lat),
            recorded_at,
            &self.placa,
            &self.tipo,
            &self.estado,
        )?;
        Ok(Some(report))
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// ============================================================================
// Predictions
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PredictionRow {
    pub eta_minutos: f64,
    pub distancia_metros: f64,
}

/// A travel-time estimate from the external prediction service.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub eta_minutes: f64,
    pub distance_m: f64,
}

impl From<PredictionRow> for Prediction {
    fn from(row: PredictionRow) -> Self {
        Self {
            eta_minutes: row.eta_minutos,
            distance_m: row.distancia_metros,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_row_to_model() {
        let row: RouteRow = serde_json::from_value(json!({
            "id_ruta": 1,
            "nombre": "Centro",
            "geom": "SRID=4326;LINESTRING(-84.4 10.34, -84.45 10.36)"
        }))
        .unwrap();

        let route = row.into_route().unwrap();
        assert_eq!(route.id, RouteIdentifier::new("1"));
        assert_eq!(&*route.name, "Centro");
        assert_eq!(route.path.0.len(), 2);
    }

    #[test]
    fn route_row_with_bad_geometry_fails() {
        let row: RouteRow = serde_json::from_value(json!({
            "id_ruta": 1,
            "nombre": "Centro",
            "geom": "SRID=4326;LINESTRING(-84.4 10.34)"
        }))
        .unwrap();

        // Parses as WKT but fails path validation (a single point).
        assert!(row.into_route().is_err());
    }

    #[test]
    fn stop_row_wkt_and_id_parada() {
        let row: StopRow = serde_json::from_value(json!({
            "id_parada": 7,
            "nombre": "Parque",
            "geom": "SRID=4326;POINT(-84.43 10.35)"
        }))
        .unwrap();

        let stop = row.into_stop(&RouteIdentifier::new("1")).unwrap();
        assert_eq!(stop.id, StopIdentifier::new("7"));
        assert_eq!(stop.location, Point::new(-84.43, 10.35));
        assert_eq!(stop.route_id, RouteIdentifier::new("1"));
    }

    #[test]
    fn stop_row_geojson_and_plain_id() {
        let row: StopRow = serde_json::from_value(json!({
            "id": 9,
            "nombre": "Mercado",
            "geom": { "type": "Point", "coordinates": [-84.46, 10.36] }
        }))
        .unwrap();

        let stop = row.into_stop(&RouteIdentifier::new("1")).unwrap();
        assert_eq!(stop.id, StopIdentifier::new("9"));
        assert_eq!(stop.location, Point::new(-84.46, 10.36));
    }

    #[test]
    fn stop_row_without_any_id_fails() {
        let row: StopRow = serde_json::from_value(json!({
            "nombre": "Fantasma",
            "geom": "POINT(-84.4 10.3)"
        }))
        .unwrap();

        assert!(row.into_stop(&RouteIdentifier::new("1")).is_err());
    }

    #[test]
    fn vehicle_row_without_position_is_dropped() {
        let row: VehicleRow = serde_json::from_value(json!({
            "id": 4,
            "placa": "SJB-123",
            "tipo": "bus",
            "estado": "activo",
            "routeId": 1,
            "lat": null,
            "lng": null,
            "timestamp": null
        }))
        .unwrap();

        assert!(row.into_report().unwrap().is_none());
    }

    #[test]
    fn vehicle_row_to_report() {
        let row: VehicleRow = serde_json::from_value(json!({
            "id": 4,
            "placa": "SJB-123",
            "tipo": "bus",
            "estado": "activo",
            "routeId": 1,
            "lat": 10.35,
            "lng": -84.43,
            "timestamp": "2024-06-01T12:00:00Z"
        }))
        .unwrap();

        let report = row.into_report().unwrap().unwrap();
        assert_eq!(report.id, VehicleIdentifier::new("4"));
        assert_eq!(report.route_id, RouteIdentifier::new("1"));
        // lat/lng fields land in canonical (lon, lat) order.
        assert_eq!(report.position, Point::new(-84.43, 10.35));
        assert!(report.recorded_at.is_some());
    }

    #[test]
    fn unparseable_timestamp_means_no_timestamp() {
        let row: VehicleRow = serde_json::from_value(json!({
            "id": 4,
            "placa": "SJB-123",
            "tipo": "bus",
            "estado": "activo",
            "routeId": 1,
            "lat": 10.35,
            "lng": -84.43,
            "timestamp": "hace cinco minutos"
        }))
        .unwrap();

        let report = row.into_report().unwrap().unwrap();
        assert!(report.recorded_at.is_none());
    }

    #[test]
    fn prediction_row_conversion() {
        let row: PredictionRow = serde_json::from_value(json!({
            "eta_minutos": 10.0,
            "distancia_metros": 2000.0
        }))
        .unwrap();

        let prediction = Prediction::from(row);
        assert_eq!(prediction.eta_minutes, 10.0);
        assert_eq!(prediction.distance_m, 2000.0);
    }
}
