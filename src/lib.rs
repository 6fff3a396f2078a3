//! Offline reverse geocoding: nearest named place for a latitude/longitude,
//! via a median-split k-d tree and a fixed pool of query workers.
//!
//! ```rust
//! use rgeocoder::{Config, Location, ReverseGeocoder};
//! use geo::Point;
//!
//! let records = vec![
//!     Location::new(51.5214588, -0.1729636, "London", "England", "", "GB"),
//!     Location::new(37.38605, -122.08385, "Mountain View", "California", "", "US"),
//! ];
//! let geocoder = ReverseGeocoder::from_records(records, Config::default())?;
//!
//! // Points follow the geo crate convention: x = longitude, y = latitude.
//! let hit = geocoder.query_one(Point::new(-122.4194, 37.7749))?.unwrap();
//! assert_eq!(hit.location.name, "Mountain View");
//! # Ok::<(), rgeocoder::GeocodeError>(())
//! ```

pub mod dispatcher;
pub mod error;
pub mod geocoder;
pub mod kdtree;
pub mod loader;
pub mod spatial;
pub mod types;
pub mod validation;

pub use dispatcher::QueryDispatcher;
pub use error::{GeocodeError, Result};
pub use geo::Point;
pub use geocoder::{GeocoderBuilder, PlaceMatch, ReverseGeocoder};
pub use kdtree::SpatialIndex;
pub use spatial::{DistanceMetric, distance_between, haversine_km};
pub use types::{Config, Location, NearestResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::spatial::{DistanceMetric, distance_between};
    pub use crate::{Config, Location, NearestResult};
    pub use crate::{GeocodeError, Result};
    pub use crate::{GeocoderBuilder, PlaceMatch, ReverseGeocoder};
    pub use geo::Point;
}
