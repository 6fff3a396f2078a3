//! Range checks for query coordinates.
//!
//! Every batch handed to the dispatcher is checked here before any lookup
//! runs; one bad point rejects the whole batch so callers never receive
//! partial results.

use crate::error::{GeocodeError, Result};
use geo::Point;

/// Checks that a query point carries a usable latitude and longitude.
///
/// Latitude must fall in [-90, 90] and longitude in [-180, 180], both
/// finite. Points follow the geo crate convention: x = longitude,
/// y = latitude.
///
/// # Examples
///
/// ```
/// use rgeocoder::validation::validate_point;
/// use geo::Point;
///
/// let query = Point::new(151.2099, -33.8651);
/// assert!(validate_point(&query).is_ok());
///
/// // Latitude and longitude swapped by mistake.
/// let swapped = Point::new(-33.8651, 151.2099);
/// assert!(validate_point(&swapped).is_err());
/// ```
pub fn validate_point(point: &Point) -> Result<()> {
    match coordinate_error(point) {
        Some(reason) => Err(GeocodeError::InvalidInput(reason)),
        None => Ok(()),
    }
}

/// Checks a whole query batch, rejecting it wholesale on the first bad
/// point. The error names the offending batch index.
///
/// # Examples
///
/// ```
/// use rgeocoder::validation::validate_points;
/// use geo::Point;
///
/// let batch = vec![Point::new(2.3522, 48.8566), Point::new(0.0, 91.0)];
/// let err = validate_points(&batch).unwrap_err();
/// assert!(err.to_string().contains("index 1"));
/// ```
pub fn validate_points(points: &[Point]) -> Result<()> {
    for (index, point) in points.iter().enumerate() {
        if let Some(reason) = coordinate_error(point) {
            return Err(GeocodeError::InvalidInput(format!(
                "point at index {}: {}",
                index, reason
            )));
        }
    }
    Ok(())
}

fn coordinate_error(point: &Point) -> Option<String> {
    let (lon, lat) = (point.x(), point.y());

    if !lat.is_finite() || !lon.is_finite() {
        return Some(format!(
            "coordinates must be finite, got ({}, {})",
            lat, lon
        ));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Some(format!("latitude {} outside [-90, 90]", lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Some(format!("longitude {} outside [-180, 180]", lon));
    }

    None
}
