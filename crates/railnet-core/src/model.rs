//! Data model shared by every pipeline stage.
//!
//! Records flow one way: [`RawPointRecord`]s are consumed by the grouper and
//! become [`StationCluster`]s, which together with [`RawSegment`]s become the
//! [`GraphNode`]s and [`GraphEdge`]s of a
//! [`RailNetworkGraph`](crate::graph::RailNetworkGraph). Nothing is mutated
//! after it has been handed to the next stage.

use std::collections::BTreeSet;

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// Mean earth radius used by `geo`'s haversine implementation, in metres.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the WGS84 lat/lon ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Euclidean distance in raw degree space.
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }

    /// Great-circle distance in metres.
    #[must_use]
    pub fn haversine_m(&self, other: &Self) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }

    /// Great-circle distance expressed as a central angle in degrees, so it
    /// can be compared against a tolerance given in degrees.
    #[must_use]
    pub fn angular_distance_deg(&self, other: &Self) -> f64 {
        (self.haversine_m(other) / MEAN_EARTH_RADIUS_M).to_degrees()
    }

    /// `[lon, lat]`, the x/y order used by the spatial index.
    #[must_use]
    pub const fn as_xy(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Arithmetic centroid. `None` for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(coords: &[Self]) -> Option<Self> {
        if coords.is_empty() {
            return None;
        }
        let n = coords.len() as f64;
        let (lat, lon) = coords
            .iter()
            .fold((0.0, 0.0), |(la, lo), c| (la + c.lat, lo + c.lon));
        Some(Self::new(lat / n, lon / n))
    }

    /// Hashable key quantised to 1e-9 degrees, used for exact-identity
    /// comparisons.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantised_key(&self) -> (i64, i64) {
        (
            (self.lat * 1e9).round() as i64,
            (self.lon * 1e9).round() as i64,
        )
    }
}

/// Source-specific tags attached to a raw record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTags {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    /// Precomputed grouping key supplied by some sources (e.g. a station
    /// group code). Records sharing a key belong to the same station.
    #[serde(default)]
    pub group_key: Option<String>,
}

/// A station or platform observation produced by an external parser.
///
/// Coordinates are optional so malformed input can still be deserialized
/// and reported instead of rejected wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPointRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: RecordTags,
}

impl RawPointRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat: Some(lat),
            lon: Some(lon),
            tags: RecordTags::default(),
        }
    }

    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.tags.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn with_group_key(mut self, key: impl Into<String>) -> Self {
        self.tags.group_key = Some(key.into());
        self
    }

    /// The record's coordinate if present and valid.
    #[must_use]
    pub fn coord(&self) -> Option<Coord> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coord::new(lat, lon)).filter(Coord::is_valid),
            _ => None,
        }
    }
}

/// A raw track or line segment between two endpoint coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub id: String,
    pub start: Coord,
    pub end: Coord,
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    /// Data source that produced the segment; becomes the edge provenance.
    #[serde(default)]
    pub source: Option<String>,
    /// Track length in metres when the source supplies one.
    #[serde(default)]
    pub length_m: Option<f64>,
}

impl RawSegment {
    #[must_use]
    pub fn new(id: impl Into<String>, start: Coord, end: Coord) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            line: None,
            operator: None,
            classification: None,
            source: None,
            length_m: None,
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn with_length(mut self, length_m: f64) -> Self {
        self.length_m = Some(length_m);
        self
    }
}

/// One logical station: an equivalence class of raw records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCluster {
    /// Id of the member closest to the centroid.
    pub id: String,
    /// Arithmetic centroid of member coordinates.
    pub coord: Coord,
    /// Most common member name.
    pub name: String,
    /// All distinct member names.
    pub names: BTreeSet<String>,
    pub operators: BTreeSet<String>,
    /// Member record ids, sorted.
    pub members: Vec<String>,
    /// Distinct member coordinates, used for endpoint snapping.
    pub member_coords: Vec<Coord>,
}

impl StationCluster {
    #[must_use]
    pub fn platform_count(&self) -> usize {
        self.members.len()
    }
}

/// Station attributes carried by a graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    pub name: String,
    pub operators: BTreeSet<String>,
    pub platform_count: usize,
    pub members: Vec<String>,
}

impl From<&StationCluster> for StationInfo {
    fn from(cluster: &StationCluster) -> Self {
        Self {
            name: cluster.name.clone(),
            operators: cluster.operators.clone(),
            platform_count: cluster.platform_count(),
            members: cluster.members.clone(),
        }
    }
}

/// Node discriminator: a clustered station or a bare track endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Station(StationInfo),
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub coord: Coord,
    pub kind: NodeKind,
}

impl GraphNode {
    #[must_use]
    pub fn station(cluster: &StationCluster) -> Self {
        Self {
            id: cluster.id.clone(),
            coord: cluster.coord,
            kind: NodeKind::Station(StationInfo::from(cluster)),
        }
    }

    #[must_use]
    pub fn infrastructure(id: impl Into<String>, coord: Coord) -> Self {
        Self {
            id: id.into(),
            coord,
            kind: NodeKind::Infrastructure,
        }
    }

    #[must_use]
    pub const fn is_station(&self) -> bool {
        matches!(self.kind, NodeKind::Station(_))
    }

    /// Short tag for reports: `"station"` or `"infrastructure"`.
    #[must_use]
    pub const fn kind_tag(&self) -> &'static str {
        match self.kind {
            NodeKind::Station(_) => "station",
            NodeKind::Infrastructure => "infrastructure",
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Station(info) => Some(info.name.as_str()),
            NodeKind::Infrastructure => None,
        }
    }
}

/// Undirected edge attributes. One edge per node pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub lines: BTreeSet<String>,
    pub operator: Option<String>,
    pub provenance: Option<String>,
    pub length_m: Option<f64>,
    /// Number of raw segments merged into this edge.
    pub segment_count: usize,
}

impl GraphEdge {
    #[must_use]
    pub fn from_segment(segment: &RawSegment) -> Self {
        Self {
            lines: segment.line.iter().cloned().collect(),
            operator: segment.operator.clone(),
            provenance: segment.source.clone(),
            length_m: segment.length_m.filter(|l| l.is_finite() && *l > 0.0),
            segment_count: 1,
        }
    }

    /// Fold another edge for the same node pair into this one: line sets are
    /// unioned, first operator/provenance wins, the shorter length is kept.
    pub fn merge(&mut self, other: Self) {
        self.lines.extend(other.lines);
        if self.operator.is_none() {
            self.operator = other.operator;
        }
        if self.provenance.is_none() {
            self.provenance = other.provenance;
        }
        self.length_m = match (self.length_m, other.length_m) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.segment_count += other.segment_count;
    }

    /// Positive finite length usable as a shortest-path weight.
    #[must_use]
    pub fn weight(&self) -> Option<f64> {
        self.length_m.filter(|l| l.is_finite() && *l > 0.0)
    }
}
