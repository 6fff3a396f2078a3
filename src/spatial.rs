//! Distance metrics over geographic coordinates.
//!
//! The metric is chosen once, at index build time, because the search's
//! pruning bounds depend on which metric is active (see
//! [`DistanceMetric::latitude_bound`] and
//! [`DistanceMetric::longitude_bound`]). Mixing metrics mid-search would
//! invalidate pruning.

use geo::{Distance, Euclidean, Point};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate surface kilometers spanned by one degree of latitude.
///
/// Slightly below the true 111.195 km/degree, so a latitude pruning bound
/// built from it can never exceed the real distance to the split parallel.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Distance metrics for nearest-neighbor search.
///
/// - **Haversine**: great-circle distance in kilometers on a spherical
///   Earth. The default; this is what downstream consumers expect from
///   returned distances.
/// - **Planar**: Euclidean distance on raw (lon, lat) degrees treated as a
///   flat plane. Cheap, unit-free, useful when relative ordering is all
///   that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Haversine,
    Planar,
}

impl DistanceMetric {
    /// Lower bound, in the metric's unit, on the distance from a query to
    /// any point beyond a latitude split `delta_degrees` away.
    ///
    /// A point whose latitude differs by d degrees is at least d * 111.19 km
    /// away under haversine, so the 111.0 factor never overestimates.
    pub(crate) fn latitude_bound(self, delta_degrees: f64) -> f64 {
        match self {
            DistanceMetric::Haversine => delta_degrees * KM_PER_DEGREE,
            DistanceMetric::Planar => delta_degrees,
        }
    }

    /// Lower bound, in the metric's unit, on the distance from a query at
    /// latitude `query_lat` to any point beyond a longitude split.
    ///
    /// Meridians converge toward the poles and wrap at the antimeridian, so
    /// a flat km/degree factor on longitude deltas overestimates there and
    /// would prune subtrees that still hold the true nearest neighbor. For
    /// haversine the bound is the cross-track distance to the split
    /// meridian's great circle, `R * asin(cos(lat) * sin(delta))`; `delta`
    /// must already account for wraparound and is clamped to 90 degrees,
    /// beyond which the formula would exceed the distance to the nearer
    /// pole. Planar treats coordinates as a flat plane with no wraparound,
    /// so the raw delta is already exact.
    pub(crate) fn longitude_bound(self, delta_degrees: f64, query_lat: f64) -> f64 {
        match self {
            DistanceMetric::Haversine => {
                let gap = delta_degrees.min(90.0).to_radians();
                EARTH_RADIUS_KM * (query_lat.to_radians().cos() * gap.sin()).asin()
            }
            DistanceMetric::Planar => delta_degrees,
        }
    }
}

/// Calculate the distance between two points using the specified metric.
///
/// Symmetric, non-negative, and zero iff the points coincide (within
/// floating tolerance). Haversine distances are in kilometers, planar
/// distances in degrees.
///
/// # Examples
///
/// ```rust
/// use rgeocoder::{DistanceMetric, spatial::distance_between};
/// use geo::Point;
///
/// let london = Point::new(-0.1729636, 51.5214588);
/// let kochi = Point::new(76.259952, 9.936033);
///
/// let km = distance_between(&london, &kochi, DistanceMetric::Haversine);
/// assert!(km > 8_000.0 && km < 9_000.0);
///
/// let same = distance_between(&london, &london, DistanceMetric::Haversine);
/// assert_eq!(same, 0.0);
/// ```
pub fn distance_between(a: &Point, b: &Point, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Haversine => haversine_km(a, b),
        DistanceMetric::Planar => Euclidean.distance(*a, *b),
    }
}

/// Great-circle distance in kilometers via the haversine formula.
pub fn haversine_km(a: &Point, b: &Point) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lon = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}
