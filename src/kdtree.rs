//! Balanced k-d tree over geographic coordinates.
//!
//! The tree is built once from a point slice and is immutable afterwards,
//! which is what makes lock-free concurrent queries from the dispatcher's
//! worker threads safe. Nodes live in a flat arena and refer to their
//! children by index, so dropping the tree never recurses.

use crate::spatial::{DistanceMetric, distance_between};
use crate::types::NearestResult;
use geo::Point;
use std::cmp::Ordering;

/// Coordinate axis a node splits on. Alternates with depth: even depths
/// split on latitude, odd depths on longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitAxis {
    Latitude,
    Longitude,
}

impl SplitAxis {
    fn at_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            SplitAxis::Latitude
        } else {
            SplitAxis::Longitude
        }
    }

    fn coordinate(self, point: &Point) -> f64 {
        match self {
            SplitAxis::Latitude => point.y(),
            SplitAxis::Longitude => point.x(),
        }
    }
}

/// One arena node: a point, its position in the original input array, the
/// axis it splits on, and optional children.
#[derive(Debug, Clone)]
struct TreeNode {
    point: Point,
    position: usize,
    axis: SplitAxis,
    left: Option<usize>,
    right: Option<usize>,
}

/// An immutable median-split k-d tree supporting 1-nearest-neighbor queries.
///
/// The distance metric is fixed at build time; the search's pruning rule
/// converts split-axis deltas into the active metric's unit, so the metric
/// cannot change per query without invalidating pruning.
///
/// # Example
///
/// ```rust
/// use rgeocoder::{DistanceMetric, SpatialIndex};
/// use geo::Point;
///
/// let points = vec![
///     Point::new(-0.1729636, 51.5214588),
///     Point::new(76.259952, 9.936033),
///     Point::new(-122.08385, 37.38605),
/// ];
/// let index = SpatialIndex::build(&points, DistanceMetric::Haversine);
///
/// let hit = index.nearest(&Point::new(-122.0, 37.4));
/// assert_eq!(hit.position, 2);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: Vec<TreeNode>,
    root: Option<usize>,
    metric: DistanceMetric,
}

impl SpatialIndex {
    /// Build an index over `points`. An empty slice yields an empty index,
    /// not an error.
    ///
    /// Points must already be range-validated; the build itself cannot fail.
    /// Runs in O(n log^2 n) from the per-level stable sort, which is
    /// acceptable for a build that happens once per process lifetime.
    pub fn build(points: &[Point], metric: DistanceMetric) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        let mut order: Vec<usize> = (0..points.len()).collect();
        let root = Self::build_subtree(&mut nodes, points, &mut order, 0);

        log::debug!(
            "built spatial index over {} points ({:?} metric)",
            points.len(),
            metric
        );

        Self {
            nodes,
            root,
            metric,
        }
    }

    fn build_subtree(
        nodes: &mut Vec<TreeNode>,
        points: &[Point],
        order: &mut [usize],
        depth: usize,
    ) -> Option<usize> {
        if order.is_empty() {
            return None;
        }

        let axis = SplitAxis::at_depth(depth);

        // Stable sort: among equal axis values the point appearing earlier
        // in the incoming order sorts first. Coordinates are validated
        // finite before build, so partial_cmp cannot actually fail.
        order.sort_by(|&a, &b| {
            axis.coordinate(&points[a])
                .partial_cmp(&axis.coordinate(&points[b]))
                .unwrap_or(Ordering::Equal)
        });

        let median = order.len() / 2;
        let position = order[median];

        let node_index = nodes.len();
        nodes.push(TreeNode {
            point: points[position],
            position,
            axis,
            left: None,
            right: None,
        });

        let (left_half, rest) = order.split_at_mut(median);
        let right_half = &mut rest[1..];

        let left = Self::build_subtree(nodes, points, left_half, depth + 1);
        let right = Self::build_subtree(nodes, points, right_half, depth + 1);

        nodes[node_index].left = left;
        nodes[node_index].right = right;

        Some(node_index)
    }

    /// Find the single nearest indexed point to `query`.
    ///
    /// Returns [`NearestResult::NO_MATCH`] on an empty index; callers treat
    /// that as "no match found", not an error. Exact distance ties break
    /// toward the node visited first, which is deterministic for a fixed
    /// point set because the build's stable sort fixes the visit order.
    pub fn nearest(&self, query: &Point) -> NearestResult {
        let Some(root) = self.root else {
            return NearestResult::NO_MATCH;
        };

        let mut best_distance = f64::INFINITY;
        let mut best_position = 0usize;
        self.search(root, query, &mut best_distance, &mut best_position);

        NearestResult::new(best_distance, best_position)
    }

    fn search(
        &self,
        node_index: usize,
        query: &Point,
        best_distance: &mut f64,
        best_position: &mut usize,
    ) {
        let node = &self.nodes[node_index];

        let d = distance_between(query, &node.point, self.metric);
        if d < *best_distance {
            *best_distance = d;
            *best_position = node.position;
        }

        let delta = node.axis.coordinate(query) - node.axis.coordinate(&node.point);
        let (near, far) = if delta <= 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search(near, query, best_distance, best_position);
        }

        // The far side can only hold a closer point if the split plane
        // itself is closer than the current best, measured in the active
        // metric's unit.
        if let Some(far) = far {
            let bound = match node.axis {
                SplitAxis::Latitude => self.metric.latitude_bound(delta.abs()),
                SplitAxis::Longitude => {
                    // The far half-plane always reaches the +-180 meridian,
                    // so under haversine the query may be closer to it
                    // across the antimeridian than across the split itself.
                    let gap = delta.abs().min(180.0 - query.x().abs());
                    self.metric.longitude_bound(gap, query.y())
                }
            };
            if bound < *best_distance {
                self.search(far, query, best_distance, best_position);
            }
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The metric fixed at build time.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}
