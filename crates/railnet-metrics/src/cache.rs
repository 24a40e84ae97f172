//! On-disk cache of centrality rankings.
//!
//! Rankings are stored as JSON under `<dir>/<hash>_<weights>_<measure>.json`,
//! where `<hash>` is the graph's content hash without its `blake3:` prefix.
//! Under [`PathMetric::Auto`] `<weights>` is a prefix of the graph's
//! [`weights_hash`], so changing a single edge length selects a new entry;
//! under [`PathMetric::Hops`] lengths cannot affect a ranking and the
//! segment is the literal `hops`. Stale entries are never read back; they
//! are simply orphaned.
//!
//! The stored file records the metric and both hashes it was computed with.
//! Any mismatch counts as a miss and the entry is overwritten.
//!
//! [`weights_hash`]: RailNetworkGraph::weights_hash

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use railnet_core::{RailNetworkGraph, RankingMeasure};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ranking::{RankedNode, rank_nodes};
use crate::topology::PathMetric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedRanking {
    content_hash: String,
    #[serde(default)]
    weights_hash: Option<String>,
    measure: RankingMeasure,
    metric: PathMetric,
    ranking: Vec<RankedNode>,
}

/// Where a ranking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Hit,
    Computed,
}

#[derive(Debug, Clone)]
pub struct CentralityCache {
    dir: PathBuf,
    metric: PathMetric,
}

impl CentralityCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, metric: PathMetric) -> Self {
        Self {
            dir: dir.into(),
            metric,
        }
    }

    /// Cache rooted at the OS cache directory (`<cache>/railnet/rankings`).
    ///
    /// # Errors
    ///
    /// Fails when the platform has no cache directory.
    pub fn in_user_cache(metric: PathMetric) -> Result<Self> {
        let mut dir = dirs::cache_dir().context("unable to determine OS cache directory")?;
        dir.push("railnet");
        dir.push("rankings");
        Ok(Self::new(dir, metric))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the ranking of `graph` by `measure`.
    #[must_use]
    pub fn entry_path(&self, graph: &RailNetworkGraph, measure: RankingMeasure) -> PathBuf {
        let hash = graph.content_hash();
        let key = hash.strip_prefix("blake3:").unwrap_or(&hash);
        let weights = self.weights_key(graph).map_or_else(
            || "hops".to_string(),
            |w| w.strip_prefix("blake3:").unwrap_or(&w).chars().take(16).collect(),
        );
        self.dir
            .join(format!("{key}_{weights}_{}.json", measure.as_str()))
    }

    /// Edge-length fingerprint relevant to rankings under this cache's metric.
    fn weights_key(&self, graph: &RailNetworkGraph) -> Option<String> {
        match self.metric {
            PathMetric::Auto => Some(graph.weights_hash()),
            PathMetric::Hops => None,
        }
    }

    /// Return the cached ranking, computing and storing it on a miss or when
    /// `force` is set. Unreadable entries are recomputed.
    ///
    /// # Errors
    ///
    /// Fails when the ranking cannot be computed or the entry cannot be
    /// written.
    pub fn get_or_compute(
        &self,
        graph: &RailNetworkGraph,
        measure: RankingMeasure,
        force: bool,
    ) -> Result<(Vec<RankedNode>, CacheSource)> {
        let path = self.entry_path(graph, measure);
        let cached = if force {
            None
        } else {
            self.read_entry(&path, graph, measure)
        };
        if let Some(ranking) = cached {
            debug!(path = %path.display(), "centrality cache hit");
            return Ok((ranking, CacheSource::Hit));
        }

        let ranking = rank_nodes(graph, measure, false, self.metric)
            .with_context(|| format!("failed to rank nodes by {measure}"))?;
        let entry = CachedRanking {
            content_hash: graph.content_hash(),
            weights_hash: self.weights_key(graph),
            measure,
            metric: self.metric,
            ranking,
        };
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let json = serde_json::to_vec_pretty(&entry).context("failed to encode ranking")?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "centrality cache stored");
        Ok((entry.ranking, CacheSource::Computed))
    }

    fn read_entry(
        &self,
        path: &Path,
        graph: &RailNetworkGraph,
        measure: RankingMeasure,
    ) -> Option<Vec<RankedNode>> {
        let bytes = fs::read(path).ok()?;
        let entry: CachedRanking = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                return None;
            }
        };
        (entry.content_hash == graph.content_hash()
            && entry.weights_hash == self.weights_key(graph)
            && entry.measure == measure
            && entry.metric == self.metric)
            .then_some(entry.ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railnet_core::{Coord, GraphEdge, GraphNode};

    fn star() -> RailNetworkGraph {
        let mut g = RailNetworkGraph::new();
        for id in ["hub", "x", "y"] {
            g.add_node(GraphNode::infrastructure(id, Coord::new(0.0, 0.0)))
                .expect("node");
        }
        g.add_or_merge_edge("hub", "x", GraphEdge::default())
            .expect("edge");
        g.add_or_merge_edge("hub", "y", GraphEdge::default())
            .expect("edge");
        g
    }

    #[test]
    fn second_lookup_hits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CentralityCache::new(dir.path(), PathMetric::Auto);
        let g = star();

        let (first, src) = cache
            .get_or_compute(&g, RankingMeasure::Betweenness, false)
            .expect("compute");
        assert_eq!(src, CacheSource::Computed);
        assert_eq!(first[0].id, "hub");
        assert!(cache.entry_path(&g, RankingMeasure::Betweenness).exists());

        let (second, src) = cache
            .get_or_compute(&g, RankingMeasure::Betweenness, false)
            .expect("hit");
        assert_eq!(src, CacheSource::Hit);
        assert_eq!(first, second);

        let (_, src) = cache
            .get_or_compute(&g, RankingMeasure::Betweenness, true)
            .expect("forced");
        assert_eq!(src, CacheSource::Computed);
    }

    #[test]
    fn structural_change_misses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CentralityCache::new(dir.path(), PathMetric::Auto);
        let mut g = star();
        cache
            .get_or_compute(&g, RankingMeasure::Degree, false)
            .expect("compute");
        g.add_or_merge_edge("x", "y", GraphEdge::default())
            .expect("edge");
        let (_, src) = cache
            .get_or_compute(&g, RankingMeasure::Degree, false)
            .expect("recompute");
        assert_eq!(src, CacheSource::Computed);
    }

    /// Square a-b-c-d with a pendant `p` on `a`; every edge measured, a-b
    /// at `ab` metres.
    fn square_with_pendant(ab: Option<f64>) -> RailNetworkGraph {
        let mut g = RailNetworkGraph::new();
        for id in ["a", "b", "c", "d", "p"] {
            g.add_node(GraphNode::infrastructure(id, Coord::new(0.0, 0.0)))
                .expect("node");
        }
        let edge = |len: Option<f64>| GraphEdge {
            length_m: len,
            ..GraphEdge::default()
        };
        g.add_or_merge_edge("a", "b", edge(ab)).expect("edge");
        g.add_or_merge_edge("b", "c", edge(Some(1.0))).expect("edge");
        g.add_or_merge_edge("c", "d", edge(Some(1.0))).expect("edge");
        g.add_or_merge_edge("d", "a", edge(Some(1.0))).expect("edge");
        g.add_or_merge_edge("a", "p", edge(Some(1.0))).expect("edge");
        g
    }

    #[test]
    fn length_change_misses_under_auto() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CentralityCache::new(dir.path(), PathMetric::Auto);
        let short = square_with_pendant(Some(1.0));
        let long = square_with_pendant(Some(100.0));
        assert_eq!(short.content_hash(), long.content_hash());

        cache
            .get_or_compute(&short, RankingMeasure::Betweenness, false)
            .expect("compute");
        let (ranking, src) = cache
            .get_or_compute(&long, RankingMeasure::Betweenness, false)
            .expect("recompute");
        assert_eq!(src, CacheSource::Computed);
        let fresh = rank_nodes(&long, RankingMeasure::Betweenness, false, PathMetric::Auto)
            .expect("rank");
        assert_eq!(ranking, fresh);
        assert_ne!(
            cache.entry_path(&short, RankingMeasure::Betweenness),
            cache.entry_path(&long, RankingMeasure::Betweenness)
        );

        let (_, src) = cache
            .get_or_compute(&short, RankingMeasure::Betweenness, false)
            .expect("hit");
        assert_eq!(src, CacheSource::Hit);
    }

    #[test]
    fn dropping_a_length_misses_under_auto() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CentralityCache::new(dir.path(), PathMetric::Auto);
        cache
            .get_or_compute(&square_with_pendant(Some(100.0)), RankingMeasure::Closeness, false)
            .expect("compute");
        let partial = square_with_pendant(None);
        let (ranking, src) = cache
            .get_or_compute(&partial, RankingMeasure::Closeness, false)
            .expect("recompute");
        assert_eq!(src, CacheSource::Computed);
        let fresh = rank_nodes(&partial, RankingMeasure::Closeness, false, PathMetric::Auto)
            .expect("rank");
        assert_eq!(ranking, fresh);
    }

    #[test]
    fn hop_rankings_ignore_lengths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CentralityCache::new(dir.path(), PathMetric::Hops);
        cache
            .get_or_compute(&square_with_pendant(Some(1.0)), RankingMeasure::Betweenness, false)
            .expect("compute");
        let (_, src) = cache
            .get_or_compute(&square_with_pendant(Some(100.0)), RankingMeasure::Betweenness, false)
            .expect("hit");
        assert_eq!(src, CacheSource::Hit);
    }

    #[test]
    fn corrupt_entry_is_recomputed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CentralityCache::new(dir.path(), PathMetric::Hops);
        let g = star();
        let path = cache.entry_path(&g, RankingMeasure::Closeness);
        fs::write(&path, b"not json").expect("write");
        let (ranking, src) = cache
            .get_or_compute(&g, RankingMeasure::Closeness, false)
            .expect("compute");
        assert_eq!(src, CacheSource::Computed);
        assert_eq!(ranking.len(), 3);
    }
}
