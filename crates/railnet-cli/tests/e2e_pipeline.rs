//! E2E tests for the full command pipeline:
//! `railnet build` → `railnet metrics` → `railnet simulate` /
//! `railnet campaign` → `railnet compare`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn railnet_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("railnet"));
    cmd.current_dir(dir);
    cmd.env("RAILNET_LOG", "error");
    cmd
}

/// Four stations, one bad record and five segments, one of which ends in
/// open track (an infrastructure node):
///
/// ```text
///        D
///       / \
/// A - B --- C - INFRA
/// ```
fn write_inputs(dir: &Path) {
    let stations = json!([
        {"id": "A", "name": "Alpha", "lat": 50.0, "lon": 8.0},
        {"id": "B", "name": "Bravo", "lat": 50.0, "lon": 8.01},
        {"id": "C", "name": "Charlie", "lat": 50.0, "lon": 8.02},
        {"id": "D", "name": "Delta", "lat": 50.01, "lon": 8.015},
        {"id": "bad", "name": "Nowhere"}
    ]);
    let segments = json!([
        {"id": "s1", "start": {"lat": 50.0, "lon": 8.0}, "end": {"lat": 50.0, "lon": 8.01}},
        {"id": "s2", "start": {"lat": 50.0, "lon": 8.01}, "end": {"lat": 50.0, "lon": 8.02}},
        {"id": "s3", "start": {"lat": 50.0, "lon": 8.01}, "end": {"lat": 50.01, "lon": 8.015}},
        {"id": "s4", "start": {"lat": 50.01, "lon": 8.015}, "end": {"lat": 50.0, "lon": 8.02}},
        {"id": "s5", "start": {"lat": 50.0, "lon": 8.02}, "end": {"lat": 50.0, "lon": 8.03}}
    ]);
    fs::write(dir.join("stations.json"), stations.to_string()).expect("write stations");
    fs::write(dir.join("segments.json"), segments.to_string()).expect("write segments");
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = railnet_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "railnet {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

fn build_graph(dir: &Path) -> PathBuf {
    write_inputs(dir);
    run_json(
        dir,
        &[
            "build",
            "--stations",
            "stations.json",
            "--segments",
            "segments.json",
            "--out",
            "graph.bin",
        ],
    );
    dir.join("graph.bin")
}

// ---------------------------------------------------------------------------
// railnet build
// ---------------------------------------------------------------------------

#[test]
fn build_reports_counts_and_skipped_records() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    let out = run_json(
        dir.path(),
        &[
            "build",
            "--stations",
            "stations.json",
            "--segments",
            "segments.json",
            "--out",
            "graph.bin",
            "--export",
            "graph.json",
        ],
    );

    assert_eq!(out["nodes"], 5);
    assert_eq!(out["edges"], 5);
    assert_eq!(out["summary"]["records"], 5);
    assert_eq!(out["summary"]["skipped_records"], 1);
    assert_eq!(out["summary"]["build"]["stations"], 4);
    assert_eq!(out["summary"]["build"]["infrastructure_nodes"], 1);
    assert_eq!(out["skipped_records"], json!(["bad"]));
    assert!(
        out["content_hash"]
            .as_str()
            .is_some_and(|h| h.starts_with("blake3:"))
    );
    assert!(dir.path().join("graph.bin").exists());

    let export: Value =
        serde_json::from_slice(&fs::read(dir.path().join("graph.json")).expect("read export"))
            .expect("export is JSON");
    assert_eq!(export["nodes"].as_array().map(Vec::len), Some(5));
    assert_eq!(export["edges"].as_array().map(Vec::len), Some(5));
}

#[test]
fn build_fails_on_missing_input() {
    let dir = TempDir::new().expect("tempdir");
    railnet_cmd(dir.path())
        .args([
            "build",
            "--stations",
            "nope.json",
            "--segments",
            "nope.json",
            "--out",
            "graph.bin",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
fn build_rejects_invalid_config() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    fs::write(
        dir.path().join("railnet.toml"),
        "[matching]\nsnap_tolerance_deg = -1.0\n",
    )
    .expect("write config");

    railnet_cmd(dir.path())
        .args([
            "build",
            "--stations",
            "stations.json",
            "--segments",
            "segments.json",
            "--out",
            "graph.bin",
        ])
        .assert()
        .failure();
    assert!(!dir.path().join("graph.bin").exists());
}

// ---------------------------------------------------------------------------
// railnet metrics
// ---------------------------------------------------------------------------

#[test]
fn metrics_json_describes_the_graph() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());

    let report = run_json(
        dir.path(),
        &["metrics", "--graph", "graph.bin", "--no-cache", "--top", "3"],
    );

    assert_eq!(report["node_count"], 5);
    assert_eq!(report["edge_count"], 5);
    assert_eq!(report["station_count"], 4);
    assert_eq!(report["component_count"], 1);
    assert_eq!(report["largest_component_nodes"], 5);
    assert_eq!(report["centrality_measure"], "betweenness");
    assert_eq!(report["centrality_top"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["ranking_cached"], false);

    let cut: Vec<&str> = report["articulation_points"]
        .as_array()
        .expect("articulation points")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(cut.contains(&"B"));
    assert!(cut.contains(&"C"));
    assert_eq!(cut.len(), 2);

    let efficiency = report["global_efficiency"].as_f64().expect("efficiency");
    assert!(efficiency > 0.0 && efficiency < 1.0);
}

#[test]
fn metrics_ranking_cache_hits_on_second_run() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());
    let args = [
        "metrics",
        "--graph",
        "graph.bin",
        "--centrality",
        "closeness",
        "--cache-dir",
        "cache",
    ];

    let first = run_json(dir.path(), &args);
    let second = run_json(dir.path(), &args);
    assert_eq!(first["ranking_cached"], false);
    assert_eq!(second["ranking_cached"], true);
    assert_eq!(first["centrality_top"], second["centrality_top"]);

    let mut forced: Vec<&str> = args.to_vec();
    forced.push("--force");
    assert_eq!(run_json(dir.path(), &forced)["ranking_cached"], false);
}

#[test]
fn metrics_fails_on_missing_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    railnet_cmd(dir.path())
        .args(["metrics", "--graph", "missing.bin", "--no-cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.bin"));
}

// ---------------------------------------------------------------------------
// railnet simulate / campaign / compare
// ---------------------------------------------------------------------------

#[test]
fn simulate_degree_attack_removes_every_node() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());

    let out = run_json(
        dir.path(),
        &[
            "simulate",
            "--graph",
            "graph.bin",
            "--strategy",
            "degree",
            "--out",
            "degree.json",
        ],
    );

    assert_eq!(out["state"], "complete");
    assert_eq!(out["error"], Value::Null);
    let records = out["trace"]["records"].as_array().expect("records");
    assert_eq!(records.len(), 5);
    // B and C both have degree 3; the tie goes to the smaller id.
    assert_eq!(records[0]["removed"], "B");
    assert_eq!(records[0]["remaining"], 4);
    assert_eq!(records[4]["remaining"], 0);
    assert_eq!(out["summary"]["steps"], 5);
    assert!(dir.path().join("degree.json").exists());
}

#[test]
fn simulate_random_is_reproducible_by_seed() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());
    let args = [
        "simulate", "--graph", "graph.bin", "--strategy", "random", "--seed", "7",
    ];

    let a = run_json(dir.path(), &args);
    let b = run_json(dir.path(), &args);
    assert_eq!(a["trace"], b["trace"]);
    assert_eq!(a["trace"]["seed"], 7);
}

#[test]
fn simulate_honours_step_budget() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());

    let out = run_json(
        dir.path(),
        &["simulate", "--graph", "graph.bin", "--budget", "2"],
    );
    assert_eq!(out["state"], "complete");
    assert_eq!(out["trace"]["records"].as_array().map(Vec::len), Some(2));
}

#[test]
fn simulate_rejects_unknown_strategy() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());

    railnet_cmd(dir.path())
        .args(["simulate", "--graph", "graph.bin", "--strategy", "pagerank"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pagerank"));
}

#[test]
fn campaign_sweep_runs_random_repeatedly_and_deterministic_once() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());

    let reports = run_json(
        dir.path(),
        &[
            "campaign",
            "--graph",
            "graph.bin",
            "-s",
            "random",
            "-s",
            "degree_adaptive",
            "--repetitions",
            "3",
            "--out",
            "sweep.json",
        ],
    );

    let reports = reports.as_array().expect("array of reports");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["strategy"], "random");
    assert_eq!(reports[0]["runs"].as_array().map(Vec::len), Some(3));
    assert_eq!(reports[1]["strategy"], "degree_adaptive");
    assert_eq!(reports[1]["runs"].as_array().map(Vec::len), Some(1));
    assert_eq!(reports[0]["aborted"], 0);
    assert!(dir.path().join("sweep.json").exists());
}

#[test]
fn compare_lines_up_traces_and_campaigns() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());
    for (strategy, file) in [("random", "random.json"), ("betweenness", "targeted.json")] {
        run_json(
            dir.path(),
            &[
                "simulate",
                "--graph",
                "graph.bin",
                "--strategy",
                strategy,
                "--out",
                file,
            ],
        );
    }
    run_json(
        dir.path(),
        &[
            "campaign",
            "--graph",
            "graph.bin",
            "-s",
            "random",
            "-s",
            "closeness",
            "--repetitions",
            "2",
            "--out",
            "sweep.json",
        ],
    );

    let rows = run_json(
        dir.path(),
        &[
            "compare",
            "failures=random.json",
            "attack=targeted.json",
            "sweep.json",
        ],
    );
    let rows = rows.as_array().expect("rows");
    let labels: Vec<&str> = rows.iter().filter_map(|r| r["label"].as_str()).collect();
    assert_eq!(
        labels,
        ["failures", "attack", "sweep/random", "sweep/closeness"]
    );
    assert_eq!(rows[1]["strategy"], "betweenness");
    assert_eq!(rows[2]["runs"], 2);
    assert!(rows[0]["critical_fraction"].is_number());
    assert!(rows[2]["critical_fraction"].is_null());
}

#[test]
fn compare_human_output_has_header() {
    let dir = TempDir::new().expect("tempdir");
    build_graph(dir.path());
    run_json(
        dir.path(),
        &["simulate", "--graph", "graph.bin", "--out", "run.json"],
    );

    railnet_cmd(dir.path())
        .args(["compare", "run.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Robustness comparison"))
        .stdout(predicate::str::contains("run"));
}

// ---------------------------------------------------------------------------
// railnet completions
// ---------------------------------------------------------------------------

#[test]
fn completions_bash_mentions_subcommands() {
    let dir = TempDir::new().expect("tempdir");
    railnet_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("railnet"))
        .stdout(predicate::str::contains("simulate"));
}
