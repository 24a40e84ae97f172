//! Single-source shortest paths over a [`Topology`].
//!
//! BFS when the topology is unweighted, Dijkstra (binary heap) when edge
//! lengths are in use. Both variants can also record the shortest-path DAG
//! (predecessor lists and path counts) needed by Brandes' betweenness.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::topology::Topology;

/// Distances from `source`; `None` for unreachable nodes.
#[must_use]
pub fn distances_from(topo: &Topology, source: usize) -> Vec<Option<f64>> {
    if topo.is_weighted() {
        dijkstra(topo, source, false).dist
    } else {
        bfs(topo, source, false).dist
    }
}

/// Shortest-path DAG rooted at one source.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub dist: Vec<Option<f64>>,
    /// Settled nodes in non-decreasing distance order.
    pub order: Vec<usize>,
    /// `predecessors[w]`: nodes immediately preceding `w` on shortest paths.
    pub predecessors: Vec<Vec<usize>>,
    /// `sigma[w]`: number of shortest paths from the source to `w`.
    pub sigma: Vec<f64>,
}

/// Shortest-path DAG from `source`, for betweenness accumulation.
#[must_use]
pub fn shortest_paths(topo: &Topology, source: usize) -> ShortestPaths {
    if topo.is_weighted() {
        dijkstra(topo, source, true)
    } else {
        bfs(topo, source, true)
    }
}

fn empty(n: usize, source: usize, track: bool) -> ShortestPaths {
    let mut dist = vec![None; n];
    dist[source] = Some(0.0);
    let mut sigma = if track { vec![0.0; n] } else { Vec::new() };
    if track {
        sigma[source] = 1.0;
    }
    ShortestPaths {
        dist,
        order: Vec::with_capacity(n),
        predecessors: if track { vec![Vec::new(); n] } else { Vec::new() },
        sigma,
    }
}

fn bfs(topo: &Topology, source: usize, track: bool) -> ShortestPaths {
    let mut sp = empty(topo.node_count(), source, track);
    let mut hops: Vec<i64> = vec![-1; topo.node_count()];
    hops[source] = 0;

    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        sp.order.push(v);
        for &(w, _) in topo.neighbors(v) {
            if hops[w] < 0 {
                hops[w] = hops[v] + 1;
                #[allow(clippy::cast_precision_loss)]
                let d = hops[w] as f64;
                sp.dist[w] = Some(d);
                queue.push_back(w);
            }
            if track && hops[w] == hops[v] + 1 {
                sp.sigma[w] += sp.sigma[v];
                sp.predecessors[w].push(v);
            }
        }
    }
    sp
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on distance, then node index.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[allow(clippy::float_cmp)]
fn dijkstra(topo: &Topology, source: usize, track: bool) -> ShortestPaths {
    let n = topo.node_count();
    let mut sp = empty(n, source, track);
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry {
        dist: 0.0,
        node: source,
    });

    while let Some(HeapEntry { dist, node: v }) = heap.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        sp.order.push(v);
        for &(w, weight) in topo.neighbors(v) {
            if settled[w] {
                continue;
            }
            let candidate = dist + weight;
            match sp.dist[w] {
                Some(current) if candidate > current => {}
                Some(current) if candidate == current => {
                    if track {
                        sp.sigma[w] += sp.sigma[v];
                        sp.predecessors[w].push(v);
                    }
                }
                _ => {
                    sp.dist[w] = Some(candidate);
                    if track {
                        sp.sigma[w] = sp.sigma[v];
                        sp.predecessors[w].clear();
                        sp.predecessors[w].push(v);
                    }
                    heap.push(HeapEntry {
                        dist: candidate,
                        node: w,
                    });
                }
            }
        }
    }
    sp
}
