//! HTTP boundary to the transport backend.
//!
//! The backend is reached through the [`TransitBackend`] trait so the
//! polling scheduler can run against anything that yields the four data
//! shapes — the live HTTP service, or an in-memory fixture in tests.

pub mod dto;
pub mod wkt;

use std::future::Future;
use std::pin::Pin;

use buswatch_transit::{Route, RouteIdentifier, Stop, TransitError, VehicleIdentifier, VehicleReport};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use dto::Prediction;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed geometry: {0}")]
    Geometry(String),

    #[error("invalid payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Transit(#[from] TransitError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Source of transit data for the monitor.
///
/// Every method fetches a full, fresh copy; the scheduler decides when
/// to call and what to keep.
pub trait TransitBackend: Send + Sync {
    /// All routes with their path geometry.
    fn routes<'a>(&'a self) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Route>>> + Send + 'a>>;

    /// The stops of one route.
    fn stops<'a>(
        &'a self,
        route: &'a RouteIdentifier,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Stop>>> + Send + 'a>>;

    /// Current positions of every vehicle.
    fn vehicles<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Vec<VehicleReport>>> + Send + 'a>>;

    /// Travel-time estimate for one vehicle from the prediction
    /// service.
    fn prediction<'a>(
        &'a self,
        vehicle: &'a VehicleIdentifier,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Prediction>> + Send + 'a>>;
}

/// The reqwest-backed implementation against the live backend.
pub struct HttpBackend {
    base: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.client.get(format!("{}{path}", self.base)).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Some backend deployments only answer with a trailing slash;
    /// retry once on 404.
    async fn get_json_retry_slash<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.client.get(format!("{}{path}", self.base)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(path, "404 without trailing slash, retrying");
            return self.get_json(&format!("{path}/")).await;
        }
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

impl TransitBackend for HttpBackend {
    fn routes<'a>(&'a self) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Route>>> + Send + 'a>> {
        Box::pin(async move {
            let rows: Vec<dto::RouteRow> = self.get_json("/rutas/").await?;
            let mut routes = Vec::with_capacity(rows.len());
            for row in rows {
                match row.into_route() {
                    Ok(route) => routes.push(route),
                    Err(err) => warn!(%err, "skipping malformed route row"),
                }
            }
            Ok(routes)
        })
    }

    fn stops<'a>(
        &'a self,
        route: &'a RouteIdentifier,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Stop>>> + Send + 'a>> {
        Box::pin(async move {
            let path = format!("/rutas/{}/paradas", route);
            let rows: Vec<dto::StopRow> = self.get_json_retry_slash(&path).await?;
            let mut stops = Vec::with_capacity(rows.len());
            for row in rows {
                match row.into_stop(route) {
                    Ok(stop) => stops.push(stop),
                    Err(err) => warn!(%route, %err, "skipping malformed stop row"),
                }
            }
            Ok(stops)
        })
    }

    fn vehicles<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Vec<VehicleReport>>> + Send + 'a>> {
        Box::pin(async move {
            let rows: Vec<dto::VehicleRow> = self.get_json("/vehiculos/").await?;
            let mut reports = Vec::with_capacity(rows.len());
            for row in rows {
                match row.into_report() {
                    Ok(Some(report)) => reports.push(report),
                    Ok(None) => debug!("vehicle without position, dropped"),
                    Err(err) => warn!(%err, "skipping malformed vehicle row"),
                }
            }
            Ok(reports)
        })
    }

    fn prediction<'a>(
        &'a self,
        vehicle: &'a VehicleIdentifier,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Prediction>> + Send + 'a>> {
        Box::pin(async move {
            let path = format!("/vehiculos/{}/prediccion", vehicle);
            let row: dto::PredictionRow = self.get_json_retry_slash(&path).await?;
            Ok(Prediction::from(row))
        })
    }
}
