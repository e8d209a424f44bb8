//! E2E tests for `linemap analyze`: rankings, weighting resolution, config
//! precedence and structured errors.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn linemap_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("linemap"));
    cmd.current_dir(dir);
    cmd.env("LINEMAP_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env("HOME", dir);
    cmd.env_remove("FORMAT");
    cmd
}

fn analyze_json(dir: &Path, extra: &[&str]) -> Value {
    let output = linemap_cmd(dir)
        .args(["analyze", "--format", "json"])
        .args(extra)
        .output()
        .expect("analyze should not crash");
    assert!(
        output.status.success(),
        "analyze failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON from analyze")
}

// ---------------------------------------------------------------------------
// Demo network
// ---------------------------------------------------------------------------

#[test]
fn demo_summary_and_rankings() {
    let dir = TempDir::new().unwrap();
    let json = analyze_json(dir.path(), &["--weighting", "raw"]);

    assert_eq!(json["summary"]["vertex_count"], 17);
    assert_eq!(json["summary"]["edge_count"], 17);
    assert_eq!(json["summary"]["total_visits"], 40);
    assert_eq!(json["weighting"], "raw");
    assert_eq!(json["normalized"], true);

    let visited = json["top_visited"].as_array().unwrap();
    assert_eq!(visited.len(), 10, "report.top defaults to 10");
    assert_eq!(visited[0]["rank"], 1);
    assert_eq!(visited[0]["token"], "O");
    assert_eq!(visited[0]["value"], 8);

    let edges = json["top_edges"].as_array().unwrap();
    assert_eq!(edges[0]["source"], "A1");
    assert_eq!(edges[0]["target"], "A2");
    assert_eq!(edges[0]["traverse_count"], 4);

    for row in json["top_closeness"].as_array().unwrap() {
        let v = row["value"].as_f64().unwrap();
        assert!(v.is_finite() && v >= 0.0);
    }
}

#[test]
fn top_flag_limits_rows() {
    let dir = TempDir::new().unwrap();
    let json = analyze_json(dir.path(), &["--weighting", "inverted", "--top", "3"]);
    assert_eq!(json["top_visited"].as_array().unwrap().len(), 3);
    assert_eq!(json["top_closeness"].as_array().unwrap().len(), 3);
    assert_eq!(json["top_edges"].as_array().unwrap().len(), 3);
    assert_eq!(json["weighting"], "inverted");
}

#[test]
fn text_mode_prints_rows() {
    let dir = TempDir::new().unwrap();
    linemap_cmd(dir.path())
        .args(["analyze", "--format", "text", "--weighting", "raw", "--top", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph vertices=17 edges=17"))
        .stdout(predicate::str::contains("visit_count  1  O  8"))
        .stdout(predicate::str::contains("edge  1  A1  A2  4"));
}

#[test]
fn pretty_mode_has_sections() {
    let dir = TempDir::new().unwrap();
    linemap_cmd(dir.path())
        .args(["analyze", "--format", "pretty", "--weighting", "raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Most visited"))
        .stdout(predicate::str::contains("Highest closeness"))
        .stdout(predicate::str::contains("Busiest edges"));
}

// ---------------------------------------------------------------------------
// Input files
// ---------------------------------------------------------------------------

#[test]
fn text_input_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("lines.txt");
    std::fs::write(&input, "# two lines\nA, B, C\n\nA B\n").unwrap();

    let json = analyze_json(
        dir.path(),
        &["--input", input.to_str().unwrap(), "--weighting", "raw"],
    );
    assert_eq!(json["summary"]["vertex_count"], 3);
    assert_eq!(json["summary"]["edge_count"], 2);
    assert_eq!(json["top_edges"][0]["source"], "A");
    assert_eq!(json["top_edges"][0]["traverse_count"], 2);
}

#[test]
fn json_input_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("lines.json");
    std::fs::write(&input, r#"[["X", "Y"], ["Y", "X"], []]"#).unwrap();

    let json = analyze_json(
        dir.path(),
        &["--input", input.to_str().unwrap(), "--weighting", "raw"],
    );
    assert_eq!(json["summary"]["vertex_count"], 2);
    assert_eq!(json["summary"]["edge_count"], 2);
}

#[test]
fn empty_input_is_an_empty_graph() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.txt");
    std::fs::write(&input, "").unwrap();

    let json = analyze_json(
        dir.path(),
        &["--input", input.to_str().unwrap(), "--weighting", "raw"],
    );
    assert_eq!(json["summary"]["vertex_count"], 0);
    assert_eq!(json["top_visited"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_weighting_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    let output = linemap_cmd(dir.path())
        .args(["analyze", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let json_end = stderr.find("\n}\n").map_or(stderr.len(), |i| i + 2);
    let err: Value = serde_json::from_str(&stderr[..json_end]).expect("structured error first");
    assert_eq!(err["error"]["error_code"], "E2001");
    assert!(
        err["error"]["suggestion"]
            .as_str()
            .unwrap()
            .contains("--weighting")
    );
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    linemap_cmd(dir.path())
        .args(["analyze", "--format", "text", "--weighting", "raw"])
        .args(["--input", "does-not-exist.txt"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error[E1001]"));
}

#[test]
fn malformed_json_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.json");
    std::fs::write(&input, r#"{"not": "sequences"}"#).unwrap();
    linemap_cmd(dir.path())
        .args(["analyze", "--format", "text", "--weighting", "raw"])
        .args(["--input", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1002]"));
}

#[test]
fn unknown_weighting_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    linemap_cmd(dir.path())
        .args(["analyze", "--weighting", "sqrt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown weighting"));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn project_config_supplies_weighting_and_top() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("linemap.toml"),
        "[closeness]\nweighting = \"inverted\"\n\n[report]\ntop = 2\n",
    )
    .unwrap();

    let json = analyze_json(dir.path(), &[]);
    assert_eq!(json["weighting"], "inverted");
    assert_eq!(json["top_visited"].as_array().unwrap().len(), 2);

    // Flags still win.
    let json = analyze_json(dir.path(), &["--weighting", "raw", "--top", "4"]);
    assert_eq!(json["weighting"], "raw");
    assert_eq!(json["top_visited"].as_array().unwrap().len(), 4);
}

#[test]
fn explicit_config_path_wins_over_project_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("linemap.toml"),
        "[closeness]\nweighting = \"inverted\"\n",
    )
    .unwrap();
    let explicit = dir.path().join("other.toml");
    std::fs::write(
        &explicit,
        "[closeness]\nweighting = \"raw\"\nnormalized = false\n",
    )
    .unwrap();

    let json = analyze_json(dir.path(), &["--config", explicit.to_str().unwrap()]);
    assert_eq!(json["weighting"], "raw");
    assert_eq!(json["normalized"], false);
}

#[test]
fn broken_config_fails_with_code() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("linemap.toml"), "[closeness\n").unwrap();
    linemap_cmd(dir.path())
        .args(["analyze", "--format", "text", "--weighting", "raw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1003]"));
}
