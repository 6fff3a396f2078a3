//! The reverse-geocoder facade.
//!
//! Ties the collaborators together: loads (or receives) the record vector,
//! validates every coordinate, builds the immutable spatial index once, and
//! spawns the query dispatcher. Queries return positions into the record
//! vector, which the facade resolves back into [`Location`]s.

use crate::dispatcher::QueryDispatcher;
use crate::error::Result;
use crate::kdtree::SpatialIndex;
use crate::loader;
use crate::types::{Config, Location, NearestResult};
use crate::validation::validate_points;
use geo::Point;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A resolved query hit: the matched record and the distance to it in the
/// active metric's unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceMatch<'a> {
    pub location: &'a Location,
    pub distance: f64,
}

/// Offline reverse geocoder over a static place dataset.
///
/// The index is built once at construction and never mutated, so any number
/// of threads may query concurrently through a shared reference.
///
/// # Example
///
/// ```rust
/// use rgeocoder::{Config, Location, ReverseGeocoder};
/// use geo::Point;
///
/// let records = vec![Location::new(
///     37.78674, -122.39222, "SampleCity", "Region", "Sub", "US",
/// )];
/// let geocoder = ReverseGeocoder::from_records(records, Config::default())?;
///
/// let hit = geocoder.query_one(Point::new(-122.39222, 37.78674))?.unwrap();
/// assert_eq!(hit.location.name, "SampleCity");
/// assert!(hit.distance < 1e-9);
/// # Ok::<(), rgeocoder::GeocodeError>(())
/// ```
pub struct ReverseGeocoder {
    index: Arc<SpatialIndex>,
    records: Vec<Location>,
    dispatcher: QueryDispatcher,
}

impl ReverseGeocoder {
    /// Build a geocoder from an in-memory record vector.
    ///
    /// Every record coordinate is range-validated; one bad record rejects
    /// the whole dataset. An empty vector is fine and yields a geocoder
    /// whose queries all report "no match".
    pub fn from_records(records: Vec<Location>, config: Config) -> Result<Self> {
        config.validate()?;

        let points: Vec<Point> = records.iter().map(Location::point).collect();
        validate_points(&points)?;

        let index = Arc::new(SpatialIndex::build(&points, config.distance_metric));
        let dispatcher = QueryDispatcher::new(Arc::clone(&index), config.worker_count);

        Ok(Self {
            index,
            records,
            dispatcher,
        })
    }

    /// Build a geocoder from a CSV stream in the `rg_cities1000.csv` layout.
    pub fn from_csv_reader<R: Read>(reader: R, config: Config) -> Result<Self> {
        let records = loader::load_from_reader(reader)?;
        Self::from_records(records, config)
    }

    /// Build a geocoder from a CSV file on disk.
    pub fn from_csv_path<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let records = loader::load_from_path(path)?;
        Self::from_records(records, config)
    }

    /// Raw core output: one `(distance, position)` pair per query point, in
    /// input order. Positions index the record vector; `-1` with a NaN
    /// distance means the index is empty.
    pub fn nearest(&self, batch: &[Point]) -> Result<Vec<NearestResult>> {
        self.dispatcher.query(batch, 1)
    }

    /// Batch lookup resolved against the record store.
    ///
    /// Order- and length-preserving; `None` entries only occur when the
    /// geocoder holds no records at all.
    pub fn query(&self, batch: &[Point]) -> Result<Vec<Option<PlaceMatch<'_>>>> {
        let results = self.dispatcher.query(batch, 1)?;
        Ok(results.iter().map(|r| self.resolve(r)).collect())
    }

    /// Single-point convenience wrapper around [`ReverseGeocoder::query`].
    pub fn query_one(&self, point: Point) -> Result<Option<PlaceMatch<'_>>> {
        let results = self.query(std::slice::from_ref(&point))?;
        Ok(results.into_iter().next().flatten())
    }

    fn resolve(&self, result: &NearestResult) -> Option<PlaceMatch<'_>> {
        if !result.is_match() {
            return None;
        }
        let location = self.records.get(result.position as usize)?;
        Some(PlaceMatch {
            location,
            distance: result.distance,
        })
    }

    /// Stop the dispatcher from picking up further queries. Meant for
    /// teardown while other threads may still be submitting batches.
    pub fn cancel(&self) {
        self.dispatcher.cancel();
    }

    /// Direct access to the underlying index, mainly for benchmarks.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Number of place records loaded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builder for geocoder construction with a choice of dataset source.
///
/// ```rust
/// use rgeocoder::{Config, DistanceMetric, GeocoderBuilder, Location};
///
/// let geocoder = GeocoderBuilder::new()
///     .config(Config::default().with_distance_metric(DistanceMetric::Planar))
///     .records(vec![Location::new(48.8566, 2.3522, "Paris", "IDF", "", "FR")])
///     .build()?;
/// assert_eq!(geocoder.len(), 1);
/// # Ok::<(), rgeocoder::GeocodeError>(())
/// ```
#[derive(Debug, Default)]
pub struct GeocoderBuilder {
    config: Config,
    csv_path: Option<PathBuf>,
    records: Option<Vec<Location>>,
}

impl GeocoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration (distance metric, worker count).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load the dataset from a CSV file at build time.
    pub fn csv_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.csv_path = Some(path.into());
        self
    }

    /// Use an in-memory record vector. Takes precedence over `csv_path`.
    pub fn records(mut self, records: Vec<Location>) -> Self {
        self.records = Some(records);
        self
    }

    /// Build the geocoder. With neither a path nor records configured the
    /// dataset is empty, which is valid: every query reports "no match".
    pub fn build(self) -> Result<ReverseGeocoder> {
        let records = match (self.records, self.csv_path) {
            (Some(records), _) => records,
            (None, Some(path)) => loader::load_from_path(path)?,
            (None, None) => Vec::new(),
        };
        ReverseGeocoder::from_records(records, self.config)
    }
}
