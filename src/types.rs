//! Configuration and data types for the geocoder.

use crate::error::{GeocodeError, Result};
use crate::spatial::DistanceMetric;
use geo::Point;
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Geocoder configuration.
///
/// Constructed once, validated, and passed down by value; there is no
/// process-wide mutable configuration state.
///
/// # Example
///
/// ```rust
/// use rgeocoder::{Config, DistanceMetric};
///
/// let config = Config::default();
/// assert_eq!(config.worker_count, 4);
///
/// let json = r#"{ "distance_metric": "planar", "worker_count": 2 }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.distance_metric, DistanceMetric::Planar);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Distance metric baked into the index at build time.
    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// Number of worker threads used for batch queries. A value of 1
    /// disables the pool and runs batches inline.
    #[serde(default = "Config::default_worker_count")]
    pub worker_count: usize,
}

impl Config {
    const fn default_worker_count() -> usize {
        4
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        assert!(workers > 0, "Worker count must be greater than zero");
        self.worker_count = workers;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(GeocodeError::InvalidInput(
                "Worker count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e.to_string()));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distance_metric: DistanceMetric::default(),
            worker_count: Self::default_worker_count(),
        }
    }
}

/// A named place record, one row of the `rg_cities1000.csv` dataset layout.
///
/// Records are owned by the caller-facing facade; the spatial index only ever
/// refers to them by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub admin1: String,
    pub admin2: String,
    pub cc: String,
}

impl Location {
    pub fn new(
        lat: f64,
        lon: f64,
        name: impl Into<String>,
        admin1: impl Into<String>,
        admin2: impl Into<String>,
        cc: impl Into<String>,
    ) -> Self {
        Self {
            lat,
            lon,
            name: name.into(),
            admin1: admin1.into(),
            admin2: admin2.into(),
            cc: cc.into(),
        }
    }

    /// The record's coordinate as a `geo::Point` (x = longitude, y = latitude).
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

/// Outcome of a single nearest-neighbor lookup.
///
/// `distance` is expressed in the active metric's unit (kilometers for
/// haversine, degrees for planar). `position` indexes the original input
/// array, or is `-1` when the index was empty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NearestResult {
    pub distance: f64,
    pub position: i64,
}

impl NearestResult {
    /// Sentinel returned for queries against an empty index.
    pub const NO_MATCH: NearestResult = NearestResult {
        distance: f64::NAN,
        position: -1,
    };

    pub fn new(distance: f64, position: usize) -> Self {
        Self {
            distance,
            position: position as i64,
        }
    }

    /// Whether this result points at a real record.
    pub fn is_match(&self) -> bool {
        self.position >= 0
    }
}
