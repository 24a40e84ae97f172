//! Known-topology regression tests for the metrics engine.
//!
//! Each fixture is a small hand-built network whose metric values can be
//! worked out on paper. Values are hardcoded so any algorithmic drift shows
//! up as a failure.

use railnet_core::{Coord, GraphEdge, GraphNode, RailNetworkGraph, RankingMeasure};
use railnet_metrics::components::{articulation_points, connected_components};
use railnet_metrics::efficiency::global_efficiency;
use railnet_metrics::{MetricsEngine, PathMetric, Topology, articulation_ranking, rank_nodes};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn network(nodes: &[&str], edges: &[(&str, &str, Option<f64>)]) -> RailNetworkGraph {
    let mut g = RailNetworkGraph::new();
    for (i, id) in nodes.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let coord = Coord::new(45.0, 7.0 + i as f64 * 0.01);
        g.add_node(GraphNode::infrastructure(*id, coord))
            .expect("add node");
    }
    for (a, b, length) in edges {
        let edge = GraphEdge {
            lines: ["L1".to_string()].into_iter().collect(),
            length_m: *length,
            ..GraphEdge::default()
        };
        g.add_or_merge_edge(a, b, edge).expect("add edge");
    }
    g
}

fn cycle5() -> RailNetworkGraph {
    network(
        &["A", "B", "C", "D", "E"],
        &[
            ("A", "B", None),
            ("B", "C", None),
            ("C", "D", None),
            ("D", "E", None),
            ("E", "A", None),
        ],
    )
}

fn path4() -> RailNetworkGraph {
    network(
        &["p1", "p2", "p3", "p4"],
        &[("p1", "p2", None), ("p2", "p3", None), ("p3", "p4", None)],
    )
}

fn star4() -> RailNetworkGraph {
    network(
        &["hub", "s1", "s2", "s3", "s4"],
        &[
            ("hub", "s1", None),
            ("hub", "s2", None),
            ("hub", "s3", None),
            ("hub", "s4", None),
        ],
    )
}

/// Two triangles joined by a single bridge `c`–`d`.
fn barbell() -> RailNetworkGraph {
    network(
        &["a", "b", "c", "d", "e", "f"],
        &[
            ("a", "b", None),
            ("b", "c", None),
            ("c", "a", None),
            ("d", "e", None),
            ("e", "f", None),
            ("f", "d", None),
            ("c", "d", None),
        ],
    )
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// Efficiency
// ---------------------------------------------------------------------------

#[test]
fn cycle_efficiency() {
    let engine = MetricsEngine::default();
    // Each node: two neighbours at 1, two at 2 → (2 + 1) / 4 = 0.75.
    assert!(approx(engine.global_efficiency(&cycle5()), 0.75));
}

#[test]
fn removing_a_cycle_node_lowers_efficiency() {
    let mut g = cycle5();
    let before = MetricsEngine::default().global_efficiency(&g);
    g.remove_node("A").expect("A exists");
    let after = MetricsEngine::default().global_efficiency(&g);
    // Path B-C-D-E: (3·1 + 2·½ + 1·⅓) · 2 / 12 = 13/18.
    assert!(approx(after, 13.0 / 18.0));
    assert!(after < before);
}

#[test]
fn star_efficiency() {
    // 8 ordered pairs at 1, 12 at 2 → (8 + 6) / 20.
    assert!(approx(MetricsEngine::default().global_efficiency(&star4()), 0.7));
}

#[test]
fn weighted_path_uses_lengths() {
    let g = network(
        &["x", "y", "z"],
        &[("x", "y", Some(1000.0)), ("y", "z", Some(3000.0))],
    );
    let weighted = MetricsEngine::new(PathMetric::Auto).global_efficiency(&g);
    // Ordered pairs: 2·(1/1000 + 1/3000 + 1/4000) / 6.
    let expected = 2.0 * (1.0 / 1000.0 + 1.0 / 3000.0 + 1.0 / 4000.0) / 6.0;
    assert!(approx(weighted, expected));

    let hops = MetricsEngine::new(PathMetric::Hops).global_efficiency(&g);
    assert!(approx(hops, (4.0 + 1.0) / 6.0));
}

#[test]
fn partial_lengths_fall_back_to_hops() {
    let g = network(
        &["x", "y", "z"],
        &[("x", "y", Some(1000.0)), ("y", "z", None)],
    );
    let topo = Topology::from_graph(&g, PathMetric::Auto);
    assert!(!topo.is_weighted());
    assert!(approx(global_efficiency(&topo), 5.0 / 6.0));
}

// ---------------------------------------------------------------------------
// Degree and centrality
// ---------------------------------------------------------------------------

#[test]
fn star_degree_distribution() {
    let dist = MetricsEngine::default().degree_distribution(&star4());
    assert_eq!(dist["hub"], 4);
    assert!(["s1", "s2", "s3", "s4"].iter().all(|s| dist[*s] == 1));
}

#[test]
fn star_hub_tops_every_measure() {
    let g = star4();
    for measure in [
        RankingMeasure::Degree,
        RankingMeasure::Betweenness,
        RankingMeasure::Closeness,
    ] {
        let ranking = rank_nodes(&g, measure, false, PathMetric::Auto).expect("rank");
        assert_eq!(ranking[0].id, "hub", "{measure}");
        assert_eq!(ranking[1].id, "s1", "{measure}: ties by id");
    }
}

#[test]
fn path_betweenness_values() {
    let ranking =
        rank_nodes(&path4(), RankingMeasure::Betweenness, false, PathMetric::Auto).expect("rank");
    let ids: Vec<&str> = ranking.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["p2", "p3", "p1", "p4"]);
    // p2 carries (p1,p3) and (p1,p4): 2 · 2 / (3 · 2).
    assert!(approx(ranking[0].score, 2.0 / 3.0));
    assert!(approx(ranking[2].score, 0.0));
}

#[test]
fn cycle_ranking_ties_start_at_smallest_id() {
    let ranking = rank_nodes(&cycle5(), RankingMeasure::Degree, false, PathMetric::Auto)
        .expect("rank");
    assert_eq!(ranking[0].id, "A");
}

// ---------------------------------------------------------------------------
// Components and cut vertices
// ---------------------------------------------------------------------------

#[test]
fn barbell_bridge_endpoints_are_cut_vertices() {
    let topo = Topology::from_graph(&barbell(), PathMetric::Auto);
    let cuts: Vec<&str> = articulation_points(&topo)
        .into_iter()
        .map(|i| topo.id(i))
        .collect();
    assert_eq!(cuts, ["c", "d"]);

    let ranking = articulation_ranking(&topo);
    assert_eq!(ranking[0].id, "c");
    assert_eq!(ranking[1].id, "d");
}

#[test]
fn barbell_split_after_bridge_removal() {
    let mut g = barbell();
    g.remove_node("c").expect("c exists");
    let topo = Topology::from_graph(&g, PathMetric::Auto);
    let comps = connected_components(&topo);
    assert_eq!(comps.len(), 2);
    assert_eq!(comps[0].len(), 3);
    assert_eq!(comps[1].len(), 2);
}

#[test]
fn report_on_barbell() {
    let report = MetricsEngine::default().report(&barbell()).expect("report");
    assert_eq!(report.node_count, 6);
    assert_eq!(report.edge_count, 7);
    assert_eq!(report.component_count, 1);
    assert_eq!(report.articulation_points, ["c", "d"]);
    assert_eq!(report.diameter, Some(3.0));
    assert_eq!(report.infrastructure_count, 6);
    assert_eq!(report.station_count, 0);
    // c and d: 1 of 3 neighbour pairs linked; the others: 1.
    assert!(approx(report.average_clustering, (4.0 + 2.0 / 3.0) / 6.0));
    let top = &report.centrality_top;
    assert!(top[0].id == "c" && top[1].id == "d");
}
