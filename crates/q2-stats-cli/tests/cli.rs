//! End-to-end tests of the `q2-stats` binary
//!
//! Every command runs with its home directory, config, manifest and log file
//! redirected into a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const INDEPENDENT_TSV: &str = "id\tgroup\tmeasure
s1\tgut\t1
s2\tgut\t2
s3\tgut\t3
s4\tgut\t4
s5\tgut\t5
s6\tskin\t6
s7\tskin\t7
s8\tskin\t8
s9\tskin\t9
s10\tskin\t10
";

const MATCHED_TSV: &str = "id\tsubject\tgroup\tmeasure
p1-0\tp1\t0\t0
p1-1\tp1\t1\t1
p2-0\tp2\t0\t0
p2-1\tp2\t1\t2
p3-0\tp3\t0\t0
p3-1\tp3\t1\t3
p4-0\tp4\t0\t0
p4-1\tp4\t1\t4
p5-0\tp5\t0\t0
p5-1\tp5\t1\t5
";

fn q2_stats(home: &Path) -> Command {
    let mut cmd = q2_stats_with_cache(home);
    cmd.env("Q2_STATS_MANIFEST", home.join("manifest.toml"))
        .env("Q2_STATS_LOG_FILE", home.join("q2-stats.log"));
    cmd
}

/// Manifest and log file follow the configured cache directory.
fn q2_stats_with_cache(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("q2-stats").unwrap();
    cmd.env("HOME", home)
        .env("Q2_STATS_CONFIG", home.join("config.toml"))
        .env_remove("Q2_STATS_MANIFEST")
        .env_remove("Q2_STATS_LOG_FILE")
        .env_remove("CARGO")
        .env_remove("RUST_LOG");
    cmd
}

/// A cargo stand-in that answers `--version` and records every other call.
#[cfg(unix)]
fn stub_cargo(dir: &TempDir, exit_code: i32) -> (String, std::path::PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let calls = dir.path().join("calls.txt");
    let script = dir.path().join("cargo");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo \"cargo 0.0.0\"; exit 0; fi\necho \"$@\" >> '{}'\nexit {}\n",
            calls.display(),
            exit_code
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    (script.to_string_lossy().to_string(), calls)
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_mann_whitney_u_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "dist.tsv", INDEPENDENT_TSV);

    let output = q2_stats(dir.path())
        .args(["run", "mann-whitney-u", "--distribution", &input])
        .args(["--compare", "reference", "--reference-group", "gut"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["doctype"]["name"], "pairwise-stats");
    assert_eq!(lines[1]["A:group"], "gut");
    assert_eq!(lines[1]["B:group"], "skin");
    let p = lines[1]["p-value"].as_f64().unwrap();
    assert!((p - 2.0 / 252.0).abs() < 1e-9);
}

#[test]
fn test_wilcoxon_writes_tsv_from_output_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "matched.tsv", MATCHED_TSV);
    let out = dir.path().join("results").join("stats.tsv");

    q2_stats(dir.path())
        .args(["run", "wilcoxon-srt", "--distribution", &input])
        .args(["--compare", "baseline", "--baseline-group", "0"])
        .args(["--alternative", "less", "--output"])
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("A:group\tA:n\tA:measure"));
    assert!(lines.next().unwrap().starts_with("0\t5\t0\t1\t5\t3\t5\t0\t"));
}

#[test]
fn test_config_default_alternative_is_used() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "dist.tsv", INDEPENDENT_TSV);

    q2_stats(dir.path())
        .args(["config", "set", "alternative", "greater"])
        .assert()
        .success();
    q2_stats(dir.path())
        .args(["config", "get", "alternative"])
        .assert()
        .success()
        .stdout(predicate::str::contains("greater"));

    // gut < skin, so "greater" leaves no evidence against the null.
    let output = q2_stats(dir.path())
        .args(["run", "mann-whitney-u", "--distribution", &input])
        .args(["--compare", "all-pairwise", "--format", "jsonl"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let row: Value = serde_json::from_str(text.lines().nth(1).unwrap()).unwrap();
    assert!((row["p-value"].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn test_invalid_comparison_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "dist.tsv", INDEPENDENT_TSV);

    q2_stats(dir.path())
        .args(["run", "mann-whitney-u", "--distribution", &input])
        .args(["--compare", "baseline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid comparison. Please either choose `reference` or `all-pairwise`",
        ));
}

#[test]
fn test_config_rejects_bad_value() {
    let dir = TempDir::new().unwrap();
    q2_stats(dir.path())
        .args(["config", "set", "output-format", "csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid output format 'csv'"));
}

#[test]
fn test_task_dry_run_prints_invocations() {
    let dir = TempDir::new().unwrap();
    q2_stats(dir.path())
        .args(["task", "lint", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "cargo clippy --workspace --all-targets -- -D warnings",
        ))
        .stdout(predicate::str::contains("cargo fmt --all -- --check"));

    q2_stats(dir.path())
        .args(["task", "distclean", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_version_json() {
    let dir = TempDir::new().unwrap();
    let output = q2_stats(dir.path())
        .args(["version", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["package"], "q2-stats");
    assert!(!value["version"].as_str().unwrap().is_empty());
}

#[test]
fn test_plugin_validate_and_entry_points() {
    let dir = TempDir::new().unwrap();
    q2_stats(dir.path())
        .args(["plugin", "validate"])
        .assert()
        .success();

    q2_stats(dir.path())
        .args(["plugin", "entry-points", "--txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[qiime2.plugins]"))
        .stdout(predicate::str::contains(
            "q2-stats = q2_stats.plugin_setup:plugin",
        ));
}

#[test]
fn test_plugin_validate_rejects_static_version() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_input(
        &dir,
        "plugin.toml",
        r#"
[package]
name = "q2-stats"
version = "1.0.0"
dynamic = ["version"]
authors = [{ name = "QIIME 2 development team" }]
description = "A QIIME 2 plugin for statistical tests."
license = "BSD-3-Clause"

[package.urls]
homepage = "https://qiime2.org"
repository = "https://github.com/qiime2/q2-stats"

[build-system]
requires = ["cargo"]

[entry-points."qiime2.plugins"]
"q2-stats" = "q2_stats.plugin_setup:plugin"
"#,
    );

    q2_stats(dir.path())
        .args(["plugin", "validate", "--descriptor", &descriptor])
        .assert()
        .failure();
}

#[test]
fn test_plugin_register_list_and_clean() {
    let dir = TempDir::new().unwrap();
    q2_stats(dir.path())
        .args(["plugin", "register"])
        .assert()
        .success();

    let manifest = fs::read_to_string(dir.path().join("manifest.toml")).unwrap();
    assert!(manifest.contains("q2_stats.plugin_setup:plugin"));
    assert!(manifest.contains("registered_at"));

    q2_stats(dir.path())
        .args(["plugin", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("q2-stats"));

    q2_stats(dir.path())
        .args(["plugin", "clean", "--yes"])
        .assert()
        .success();
    q2_stats(dir.path())
        .args(["plugin", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No plugins registered."));
}

#[cfg(unix)]
#[test]
fn test_task_stops_at_first_failure_and_propagates_exit_code() {
    let dir = TempDir::new().unwrap();
    let (cargo, calls) = stub_cargo(&dir, 3);

    q2_stats(dir.path())
        .args(["config", "set", "cargo-path", &cargo])
        .assert()
        .success();

    q2_stats(dir.path())
        .args(["task", "lint"])
        .assert()
        .code(3);

    let recorded = fs::read_to_string(&calls).unwrap();
    let lines: Vec<&str> = recorded.lines().collect();
    assert_eq!(lines, vec!["clippy --workspace --all-targets -- -D warnings"]);
}

#[cfg(unix)]
#[test]
fn test_task_runs_every_invocation_on_success() {
    let dir = TempDir::new().unwrap();
    let (cargo, calls) = stub_cargo(&dir, 0);

    q2_stats(dir.path())
        .args(["config", "set", "cargo-path", &cargo])
        .assert()
        .success();

    q2_stats(dir.path()).args(["task", "lint"]).assert().success();

    let recorded = fs::read_to_string(&calls).unwrap();
    let lines: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        lines,
        vec![
            "clippy --workspace --all-targets -- -D warnings",
            "fmt --all -- --check"
        ]
    );
}

#[test]
fn test_cache_path_locates_manifest_and_log() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("custom-cache");

    q2_stats_with_cache(dir.path())
        .args(["config", "set", "cache-path"])
        .arg(&cache)
        .assert()
        .success();
    q2_stats_with_cache(dir.path())
        .args(["plugin", "register"])
        .assert()
        .success();

    assert!(cache.join("manifest.toml").exists());
    let log = fs::read_to_string(cache.join("q2-stats.log")).unwrap();
    assert!(log.contains("Registered q2-stats"));
}

#[test]
fn test_plugin_validate_warns_about_unloadable_target() {
    let dir = TempDir::new().unwrap();
    let bundled = include_str!("../../q2-stats/plugin.toml");
    let descriptor = write_input(
        &dir,
        "plugin.toml",
        &bundled.replace("q2_stats.plugin_setup:plugin", "q2_stats.other:plugin"),
    );

    q2_stats(dir.path())
        .args(["plugin", "validate", "--descriptor", &descriptor])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "loadable: q2_stats.plugin_setup:plugin",
        ));
}

#[test]
fn test_unknown_reference_group_is_reported_as_float() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "matched.tsv", MATCHED_TSV);

    q2_stats(dir.path())
        .args(["run", "wilcoxon-srt", "--distribution", &input])
        .args(["--compare", "baseline", "--baseline-group", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "7.0 was not found as a group within the distribution.",
        ));
}
