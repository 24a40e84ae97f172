//! Station clustering: raw station/platform records → [`StationCluster`]s.
//!
//! # Overview
//!
//! Records are partitioned with a [`DisjointSet`] over their positions.
//! Two merge criteria run in order:
//!
//! 1. **Name groups**: records sharing a source-supplied `group_key` are
//!    unioned, and so are records with the same normalised display name
//!    lying within `name_group_radius_m` metres of each other.
//! 2. **Interchanges**: records at the identical coordinate (quantised to
//!    1e-9 degrees) are unioned even when their names differ. Because this
//!    runs over every record, two name groups sharing any member coordinate
//!    end up in one station.
//!
//! Each resulting equivalence class becomes one cluster whose coordinate is
//! the member centroid and whose id is the id of the member closest to that
//! centroid (ties broken by the lexicographically smallest id).
//!
//! Records with missing or invalid coordinates, an empty id, or an id seen
//! before are skipped and reported as [`ErrorCode::InvalidRecord`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info, instrument};

use crate::config::GroupingConfig;
use crate::error::{Diagnostics, ErrorCode};
use crate::model::{Coord, RawPointRecord, StationCluster};
use crate::spatial::{DistanceMode, SpatialMatcher};
use crate::union_find::DisjointSet;

/// Result of a grouping pass.
#[derive(Debug, Clone, Default)]
pub struct GroupingOutcome {
    /// Clusters sorted by id.
    pub clusters: Vec<StationCluster>,
    /// Ids (or `#<position>` for records without one) that were skipped.
    pub skipped: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Union-find station clustering.
#[derive(Debug, Clone)]
pub struct StationGrouper {
    config: GroupingConfig,
    mode: DistanceMode,
}

struct ValidRecord<'a> {
    record: &'a RawPointRecord,
    coord: Coord,
}

impl StationGrouper {
    #[must_use]
    pub const fn new(config: GroupingConfig, mode: DistanceMode) -> Self {
        Self { config, mode }
    }

    /// Partition `records` into station clusters.
    #[must_use]
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn group(&self, records: &[RawPointRecord]) -> GroupingOutcome {
        let mut outcome = GroupingOutcome::default();
        let valid = Self::validate(records, &mut outcome);

        let mut sets = DisjointSet::new(valid.len());
        let key_unions = Self::union_group_keys(&valid, &mut sets);
        let name_unions = self.union_nearby_names(&valid, &mut sets);
        let coord_unions = if self.config.merge_exact_coordinates {
            Self::union_shared_coordinates(&valid, &mut sets)
        } else {
            0
        };
        debug!(key_unions, name_unions, coord_unions, "union phases complete");

        outcome.clusters = sets
            .groups()
            .into_iter()
            .map(|members| self.build_cluster(&valid, &members))
            .collect();
        outcome.clusters.sort_by(|a, b| a.id.cmp(&b.id));

        info!(
            clusters = outcome.clusters.len(),
            skipped = outcome.skipped.len(),
            "station grouping complete"
        );
        outcome
    }

    fn validate<'a>(
        records: &'a [RawPointRecord],
        outcome: &mut GroupingOutcome,
    ) -> Vec<ValidRecord<'a>> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
        let mut valid = Vec::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            let subject = if record.id.is_empty() {
                format!("#{pos}")
            } else {
                record.id.clone()
            };
            let problem = if record.id.is_empty() {
                Some("record has an empty id")
            } else if seen.contains(record.id.as_str()) {
                Some("duplicate record id")
            } else if record.lat.is_none() || record.lon.is_none() {
                Some("missing latitude/longitude")
            } else if record.coord().is_none() {
                Some("latitude/longitude out of range or not finite")
            } else {
                None
            };

            match (problem, record.coord()) {
                (None, Some(coord)) => {
                    seen.insert(record.id.as_str());
                    valid.push(ValidRecord { record, coord });
                }
                (problem, _) => {
                    let message = problem.unwrap_or("invalid coordinate");
                    debug!(record = %subject, message, "skipping record");
                    outcome
                        .diagnostics
                        .record(ErrorCode::InvalidRecord, subject.clone(), message);
                    outcome.skipped.push(subject);
                }
            }
        }
        valid
    }

    fn union_group_keys(valid: &[ValidRecord<'_>], sets: &mut DisjointSet) -> usize {
        let mut first_by_key: HashMap<&str, usize> = HashMap::new();
        let mut unions = 0;
        for (i, v) in valid.iter().enumerate() {
            let Some(key) = v.record.tags.group_key.as_deref() else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            match first_by_key.get(key) {
                Some(&first) => unions += usize::from(sets.union(first, i)),
                None => {
                    first_by_key.insert(key, i);
                }
            }
        }
        unions
    }

    fn union_nearby_names(&self, valid: &[ValidRecord<'_>], sets: &mut DisjointSet) -> usize {
        let names: Vec<String> = valid.iter().map(|v| normalise_name(&v.record.name)).collect();
        let index = SpatialMatcher::from_points(
            self.mode,
            valid.iter().map(|v| (v.record.id.as_str(), v.coord)),
        );
        let mut unions = 0;
        for (i, v) in valid.iter().enumerate() {
            if names[i].is_empty() {
                continue;
            }
            for hit in index.query_metres(&v.coord, self.config.name_group_radius_m) {
                if hit.index > i && names[hit.index] == names[i] {
                    unions += usize::from(sets.union(i, hit.index));
                }
            }
        }
        unions
    }

    fn union_shared_coordinates(valid: &[ValidRecord<'_>], sets: &mut DisjointSet) -> usize {
        let mut first_at: HashMap<(i64, i64), usize> = HashMap::new();
        let mut unions = 0;
        for (i, v) in valid.iter().enumerate() {
            match first_at.get(&v.coord.quantised_key()) {
                Some(&first) => unions += usize::from(sets.union(first, i)),
                None => {
                    first_at.insert(v.coord.quantised_key(), i);
                }
            }
        }
        unions
    }

    fn build_cluster(&self, valid: &[ValidRecord<'_>], members: &[usize]) -> StationCluster {
        let coords: Vec<Coord> = members.iter().map(|&i| valid[i].coord).collect();
        let centroid = Coord::centroid(&coords).unwrap_or(coords[0]);

        let id = members
            .iter()
            .map(|&i| {
                let v = &valid[i];
                (self.mode.distance_deg(&v.coord, &centroid), v.record.id.as_str())
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, id)| id.to_string())
            .unwrap_or_default();

        let mut name_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut names = BTreeSet::new();
        let mut operators = BTreeSet::new();
        let mut member_ids = Vec::with_capacity(members.len());
        let mut member_coords = Vec::new();
        let mut seen_coords = HashSet::new();
        for &i in members {
            let record = valid[i].record;
            let name = record.name.trim();
            if !name.is_empty() {
                *name_counts.entry(name).or_default() += 1;
                names.insert(name.to_string());
            }
            if let Some(op) = record
                .tags
                .operator
                .as_deref()
                .map(str::trim)
                .filter(|op| !op.is_empty())
            {
                operators.insert(op.to_string());
            }
            member_ids.push(record.id.clone());
            if seen_coords.insert(valid[i].coord.quantised_key()) {
                member_coords.push(valid[i].coord);
            }
        }
        member_ids.sort();

        // Most common name; BTreeMap iteration makes the tie-break lexicographic.
        let name = name_counts
            .iter()
            .fold(None::<(&str, usize)>, |best, (&n, &c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((n, c)),
            })
            .map(|(n, _)| n.to_string())
            .unwrap_or_default();

        StationCluster {
            id,
            coord: centroid,
            name,
            names,
            operators,
            members: member_ids,
            member_coords,
        }
    }
}

/// Case- and whitespace-insensitive name key.
fn normalise_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
