//! Tolerant point matching over geographic coordinates.
//!
//! # Overview
//!
//! [`SpatialMatcher`] indexes `(id, coordinate)` pairs in an R-tree keyed by
//! `[lon, lat]` and answers "which points lie within ε of this coordinate?"
//! without pairwise scans.
//!
//! # Distances
//!
//! The tolerance ε is always in degrees. In [`DistanceMode::Planar`] the
//! distance is Euclidean in degree space; in [`DistanceMode::Haversine`] it
//! is the great-circle central angle in degrees. The R-tree prefilter is
//! widened by `1 / cos(lat)` in the haversine case so the exact check never
//! misses a candidate.
//!
//! # Determinism
//!
//! Results are ordered by ascending distance, then ascending id. The
//! comparison is inclusive: a point at exactly ε matches. An empty result
//! is a valid outcome, not an error.

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::model::{Coord, MEAN_EARTH_RADIUS_M};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Relative slack added to R-tree prefilter radii.
const PREFILTER_SLACK: f64 = 1.01;

/// Lower bound for `cos(lat)` when widening the prefilter near the poles.
const MIN_COS_LAT: f64 = 1e-6;

/// Metric used for tolerance comparisons. Fixed for one matcher so every
/// query within an invocation is consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    #[default]
    Planar,
    Haversine,
}

impl DistanceMode {
    /// Distance between two coordinates in degrees.
    #[must_use]
    pub fn distance_deg(self, a: &Coord, b: &Coord) -> f64 {
        match self {
            Self::Planar => a.planar_distance(b),
            Self::Haversine => a.angular_distance_deg(b),
        }
    }
}

/// One candidate returned by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMatch<'a> {
    /// Insertion index of the matched point.
    pub index: usize,
    pub id: &'a str,
    /// Distance in degrees (or metres for [`SpatialMatcher::query_metres`]).
    pub distance: f64,
}

/// R-tree backed point index.
#[derive(Debug, Clone)]
pub struct SpatialMatcher {
    mode: DistanceMode,
    tree: RTree<IndexedPoint>,
    points: Vec<(String, Coord)>,
}

impl SpatialMatcher {
    #[must_use]
    pub fn new(mode: DistanceMode) -> Self {
        Self {
            mode,
            tree: RTree::new(),
            points: Vec::new(),
        }
    }

    /// Bulk-load an index. Insertion indices follow iteration order.
    #[must_use]
    pub fn from_points<I, S>(mode: DistanceMode, points: I) -> Self
    where
        I: IntoIterator<Item = (S, Coord)>,
        S: Into<String>,
    {
        let points: Vec<(String, Coord)> =
            points.into_iter().map(|(id, c)| (id.into(), c)).collect();
        let items: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, (_, c))| GeomWithData::new(c.as_xy(), i))
            .collect();
        Self {
            mode,
            tree: RTree::bulk_load(items),
            points,
        }
    }

    /// Add one point, returning its insertion index.
    pub fn insert(&mut self, id: impl Into<String>, coord: Coord) -> usize {
        let index = self.points.len();
        self.tree.insert(GeomWithData::new(coord.as_xy(), index));
        self.points.push((id.into(), coord));
        index
    }

    #[must_use]
    pub const fn mode(&self) -> DistanceMode {
        self.mode
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn id(&self, index: usize) -> Option<&str> {
        self.points.get(index).map(|(id, _)| id.as_str())
    }

    #[must_use]
    pub fn coord(&self, index: usize) -> Option<Coord> {
        self.points.get(index).map(|(_, c)| *c)
    }

    /// All points within `eps` degrees of `coord`, nearest first, ties by id.
    #[must_use]
    pub fn query(&self, coord: &Coord, eps: f64) -> Vec<SpatialMatch<'_>> {
        if !(eps.is_finite() && eps >= 0.0) {
            return Vec::new();
        }
        let radius = match self.mode {
            DistanceMode::Planar => eps * PREFILTER_SLACK,
            DistanceMode::Haversine => widen_for_latitude(coord.lat, eps),
        };
        self.collect_within(coord, radius, |c| self.mode.distance_deg(coord, c), eps)
    }

    /// All points within `radius_m` metres (great-circle) of `coord`,
    /// nearest first, ties by id. Independent of the matcher's mode.
    #[must_use]
    pub fn query_metres(&self, coord: &Coord, radius_m: f64) -> Vec<SpatialMatch<'_>> {
        if !(radius_m.is_finite() && radius_m >= 0.0) {
            return Vec::new();
        }
        let deg = (radius_m / MEAN_EARTH_RADIUS_M).to_degrees();
        let radius = widen_for_latitude(coord.lat, deg);
        self.collect_within(coord, radius, |c| coord.haversine_m(c), radius_m)
    }

    /// Best match within `eps`, if any.
    #[must_use]
    pub fn nearest_within(&self, coord: &Coord, eps: f64) -> Option<SpatialMatch<'_>> {
        self.query(coord, eps).into_iter().next()
    }

    fn collect_within<F>(
        &self,
        coord: &Coord,
        prefilter_radius: f64,
        distance: F,
        limit: f64,
    ) -> Vec<SpatialMatch<'_>>
    where
        F: Fn(&Coord) -> f64,
    {
        let mut matches: Vec<SpatialMatch<'_>> = self
            .tree
            .locate_within_distance(coord.as_xy(), prefilter_radius * prefilter_radius)
            .filter_map(|item| {
                let index = item.data;
                let (id, c) = &self.points[index];
                let d = distance(c);
                (d <= limit).then_some(SpatialMatch {
                    index,
                    id: id.as_str(),
                    distance: d,
                })
            })
            .collect();
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(b.id)));
        matches
    }
}

/// Degree-space radius that contains every point within `deg` central
/// angle of a point at latitude `lat`.
fn widen_for_latitude(lat: f64, deg: f64) -> f64 {
    let extreme = (lat.abs() + deg).min(90.0);
    let cos = extreme.to_radians().cos().max(MIN_COS_LAT);
    deg / cos * PREFILTER_SLACK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(mode: DistanceMode) -> SpatialMatcher {
        SpatialMatcher::from_points(
            mode,
            vec![
                ("b", Coord::new(35.0, 139.0)),
                ("a", Coord::new(35.0, 139.0)),
                ("c", Coord::new(35.000_001, 139.0)),
                ("far", Coord::new(36.0, 139.0)),
            ],
        )
    }

    #[test]
    fn query_orders_by_distance_then_id() {
        let m = matcher(DistanceMode::Planar);
        let hits = m.query(&Coord::new(35.0, 139.0), 2e-6);
        let ids: Vec<&str> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(hits[0].distance.abs() < 1e-15);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let m = matcher(DistanceMode::Planar);
        assert!(m.query(&Coord::new(10.0, 10.0), 2e-6).is_empty());
        assert!(m.nearest_within(&Coord::new(10.0, 10.0), 2e-6).is_none());
    }

    #[test]
    fn tolerance_is_inclusive() {
        let m = SpatialMatcher::from_points(
            DistanceMode::Planar,
            vec![("p", Coord::new(0.0, 0.5))],
        );
        assert_eq!(m.query(&Coord::new(0.0, 0.0), 0.5).len(), 1);
        assert!(m.query(&Coord::new(0.0, 0.0), 0.499_999).is_empty());
    }

    #[test]
    fn haversine_mode_widens_longitude_at_high_latitude() {
        // At 60N one degree of longitude spans half a degree of arc.
        let m = SpatialMatcher::from_points(
            DistanceMode::Haversine,
            vec![("east", Coord::new(60.0, 10.0008))],
        );
        let q = Coord::new(60.0, 10.0);
        assert_eq!(m.query(&q, 0.0005).len(), 1);

        let planar = SpatialMatcher::from_points(
            DistanceMode::Planar,
            vec![("east", Coord::new(60.0, 10.0008))],
        );
        assert!(planar.query(&q, 0.0005).is_empty());
    }

    #[test]
    fn incremental_insert_is_queryable() {
        let mut m = SpatialMatcher::new(DistanceMode::Planar);
        assert!(m.is_empty());
        let i = m.insert("INFRA_0", Coord::new(1.0, 1.0));
        assert_eq!(i, 0);
        let hit = m.nearest_within(&Coord::new(1.0, 1.000_001), 2e-6).expect("hit");
        assert_eq!(hit.id, "INFRA_0");
        assert_eq!(m.coord(0), Some(Coord::new(1.0, 1.0)));
    }

    #[test]
    fn query_metres_uses_great_circle() {
        let m = SpatialMatcher::from_points(
            DistanceMode::Planar,
            vec![
                ("near", Coord::new(35.0, 139.002)), // ~182 m east
                ("far", Coord::new(35.0, 139.01)),   // ~911 m east
            ],
        );
        let hits = m.query_metres(&Coord::new(35.0, 139.0), 300.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "near");
        assert!((hits[0].distance - 182.2).abs() < 1.0, "got {}", hits[0].distance);
    }

    #[test]
    fn negative_or_nan_tolerance_matches_nothing() {
        let m = matcher(DistanceMode::Planar);
        assert!(m.query(&Coord::new(35.0, 139.0), -1.0).is_empty());
        assert!(m.query(&Coord::new(35.0, 139.0), f64::NAN).is_empty());
    }
}
