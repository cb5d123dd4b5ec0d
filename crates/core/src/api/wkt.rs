//! Minimal EWKT parsing for the two shapes the backend emits:
//! `SRID=4326;LINESTRING(lon lat, ...)` and `SRID=4326;POINT(lon lat)`.
//! The SRID prefix is optional; coordinates are in wire order
//! (longitude first), which is also the canonical internal order.

use geo::{Coord, LineString, Point};

use super::ApiError;

pub fn parse_linestring(text: &str) -> Result<LineString, ApiError> {
    let body = body_of(text, "LINESTRING")?;
    let coords = body
        .split(',')
        .map(parse_pair)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::new(coords))
}

pub fn parse_point(text: &str) -> Result<Point, ApiError> {
    let body = body_of(text, "POINT")?;
    Ok(Point::from(parse_pair(body)?))
}

/// Strip an optional `SRID=nnnn;` prefix.
fn strip_srid(text: &str) -> &str {
    match text.split_once(';') {
        Some((head, rest)) if head.starts_with("SRID=") => rest,
        _ => text,
    }
}

/// The text between the parentheses of `KEYWORD ( ... )`.
fn body_of<'a>(text: &'a str, keyword: &str) -> Result<&'a str, ApiError> {
    let trimmed = strip_srid(text.trim()).trim();
    trimmed
        .strip_prefix(keyword)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| malformed(text))
}

fn parse_pair(pair: &str) -> Result<Coord, ApiError> {
    let mut parts = pair.split_whitespace();
    let lon = parts.next().and_then(|p| p.parse().ok());
    let lat = parts.next().and_then(|p| p.parse().ok());
    match (lon, lat) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(malformed(pair)),
    }
}

fn malformed(text: &str) -> ApiError {
    ApiError::Geometry(format!("unparseable WKT: {text:?}"))
}
