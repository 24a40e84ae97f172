//! Connected components and articulation points.

use std::collections::VecDeque;

use crate::topology::Topology;

/// Connected components as sorted dense-index lists, largest first, ties
/// broken by smallest member.
#[must_use]
pub fn connected_components(topo: &Topology) -> Vec<Vec<usize>> {
    let n = topo.node_count();
    let mut seen = vec![false; n];
    let mut components = Vec::new();
    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for &(w, _) in topo.neighbors(v) {
                if !seen[w] {
                    seen[w] = true;
                    members.push(w);
                    queue.push_back(w);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    components
}

/// Members of the largest connected component (empty for an empty graph).
#[must_use]
pub fn largest_component(topo: &Topology) -> Vec<usize> {
    connected_components(topo)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Nodes whose removal increases the number of connected components,
/// sorted by dense index.
///
/// Iterative Tarjan low-link DFS, so deep chains cannot overflow the stack.
#[must_use]
pub fn articulation_points(topo: &Topology) -> Vec<usize> {
    const UNVISITED: usize = usize::MAX;
    let n = topo.node_count();
    let mut disc = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut is_cut = vec![false; n];
    let mut timer = 0usize;

    for root in 0..n {
        if disc[root] != UNVISITED {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;
        let mut root_children = 0usize;
        // (node, parent, next neighbour position)
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, UNVISITED, 0)];

        while let Some(frame) = stack.last_mut() {
            let (v, parent, pos) = *frame;
            if let Some(&(w, _)) = topo.neighbors(v).get(pos) {
                frame.2 += 1;
                if disc[w] == UNVISITED {
                    disc[w] = timer;
                    low[w] = timer;
                    timer += 1;
                    if v == root {
                        root_children += 1;
                    }
                    stack.push((w, v, 0));
                } else if w != parent {
                    low[v] = low[v].min(disc[w]);
                }
            } else {
                stack.pop();
                if parent != UNVISITED {
                    low[parent] = low[parent].min(low[v]);
                    if parent != root && low[v] >= disc[parent] {
                        is_cut[parent] = true;
                    }
                }
            }
        }
        if root_children > 1 {
            is_cut[root] = true;
        }
    }

    (0..n).filter(|&i| is_cut[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_sorted_by_size() {
        let t = Topology::from_edges(
            &["a", "b", "c", "d", "e", "f"],
            &[("a", "b"), ("c", "d"), ("d", "e")],
        );
        let comps = connected_components(&t);
        assert_eq!(comps, vec![vec![2, 3, 4], vec![0, 1], vec![5]]);
        assert_eq!(largest_component(&t), vec![2, 3, 4]);
    }

    #[test]
    fn empty_graph_has_no_components() {
        let t = Topology::from_edges(&[], &[]);
        assert!(connected_components(&t).is_empty());
        assert!(largest_component(&t).is_empty());
    }

    #[test]
    fn path_interior_nodes_are_cut_vertices() {
        let t = Topology::from_edges(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        assert_eq!(articulation_points(&t), vec![1, 2]);
    }

    #[test]
    fn cycle_has_none() {
        let t = Topology::from_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert!(articulation_points(&t).is_empty());
    }

    #[test]
    fn barbell_bridge_ends() {
        // Triangles a-b-c and d-e-f joined by c-d.
        let t = Topology::from_edges(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("d", "e"),
                ("e", "f"),
                ("f", "d"),
                ("c", "d"),
            ],
        );
        assert_eq!(articulation_points(&t), vec![2, 3]);
    }

    #[test]
    fn star_root_is_cut_vertex() {
        let t = Topology::from_edges(&["a", "b", "c"], &[("a", "b"), ("a", "c")]);
        assert_eq!(articulation_points(&t), vec![0]);
    }
}
