use q2_stats::plugin::registry;
use q2_stats::table::{read_distribution, write_stats_table, COLUMNS};
use q2_stats::{ActionArgs, OutputFormat, StatsError};
use q2_stats_manifest::{EntryPoint, PLUGIN_GROUP};
use serde_json::Value;
use std::fs;
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

fn matched_jsonl() -> String {
    let header = serde_json::json!({
        "doctype": {"name": "dist1d", "format": "application/x-json-lines", "version": "1.0"},
        "direction": "row",
        "style": "key:value",
        "fields": [
            {"name": "id", "type": "string", "missing": false, "title": "id", "description": null},
            {"name": "subject", "type": "string", "missing": false, "title": "subject", "description": null},
            {"name": "group", "type": "number", "missing": false, "title": "week", "description": "Week of sampling"},
            {"name": "measure", "type": "number", "missing": false, "title": "faith_pd", "description": null}
        ],
        "index": []
    });
    let mut lines = vec![header.to_string()];
    for (subject, before, after) in [("p1", 0.0, 1.0), ("p2", 0.0, 2.0), ("p3", 0.0, 3.0), ("p4", 0.0, 4.0), ("p5", 0.0, 5.0)] {
        lines.push(
            serde_json::json!({"id": format!("{subject}-0"), "subject": subject, "group": 0, "measure": before})
                .to_string(),
        );
        lines.push(
            serde_json::json!({"id": format!("{subject}-1"), "subject": subject, "group": 1, "measure": after})
                .to_string(),
        );
    }
    lines.join("\n") + "\n"
}

fn load_plugin() -> q2_stats::Plugin {
    let ep = EntryPoint::parse(PLUGIN_GROUP, "q2-stats", "q2_stats.plugin_setup:plugin").unwrap();
    registry::load(&ep).unwrap()
}

#[test]
fn test_mann_whitney_u_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("dist.tsv");
    fs::write(&input, INDEPENDENT_TSV).unwrap();

    let dist = read_distribution(&input).unwrap();
    let args = ActionArgs::new()
        .with_input("distribution", dist)
        .with_parameter("compare", "reference")
        .with_parameter("reference_group", "gut");
    let table = load_plugin().invoke("mann_whitney_u", args).unwrap();

    let mut out = Vec::new();
    write_stats_table(&table, &mut out, OutputFormat::Jsonl).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

    assert_eq!(lines[0]["doctype"]["name"], "pairwise-stats");
    assert_eq!(lines[0]["fields"].as_array().unwrap().len(), COLUMNS.len());
    assert_eq!(lines[0]["fields"][7]["title"], "Mann-Whitney U");
    assert_eq!(lines.len(), 2);

    let row = &lines[1];
    assert_eq!(row["A:group"], "gut");
    assert_eq!(row["B:group"], "skin");
    assert_eq!(row["n"], 10);
    assert_eq!(row["test-statistic"], 0.0);
    let p = row["p-value"].as_f64().unwrap();
    assert!((p - 2.0 / 252.0).abs() < 1e-9);
    assert_eq!(row["q-value"].as_f64().unwrap(), p);
}

#[test]
fn test_wilcoxon_end_to_end_from_jsonl() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("matched.jsonl");
    fs::write(&input, matched_jsonl()).unwrap();

    let dist = read_distribution(&input).unwrap();
    let args = ActionArgs::new()
        .with_input("distribution", dist)
        .with_parameter("compare", "baseline")
        .with_parameter("baseline_group", "0")
        .with_parameter("alternative", "less");
    let table = load_plugin().invoke("wilcoxon_srt", args).unwrap();

    assert_eq!(table.len(), 1);
    let row = &table.rows[0];
    assert_eq!(row.n, 5);
    assert!((row.p_value - 0.031_25).abs() < 1e-12);
    assert_eq!(table.column_attrs("A:group").title.as_deref(), Some("week"));

    let mut out = Vec::new();
    write_stats_table(&table, &mut out, OutputFormat::Tsv).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("A:group\tA:n\tA:measure"));
    assert!(text.lines().nth(1).unwrap().starts_with("0\t5\t0\t1\t5\t3\t5\t0\t"));
}

#[test]
fn test_invalid_alternative_message() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("dist.tsv");
    fs::write(&input, INDEPENDENT_TSV).unwrap();

    let args = ActionArgs::new()
        .with_input("distribution", read_distribution(&input).unwrap())
        .with_parameter("compare", "all-pairwise")
        .with_parameter("alternative", "sideways");
    let err = load_plugin().invoke("mann_whitney_u", args).unwrap_err();
    assert!(matches!(err, StatsError::InvalidAlternative(_)));
    assert_eq!(
        err.to_string(),
        "Invalid `alternative` hypothesis selected. Please either choose `two-sided`, \
         `greater` or `less` as your alternative hypothesis."
    );
}

#[test]
fn test_entry_point_manifest() {
    let plugin = load_plugin();
    let entry = plugin.manifest("q2_stats.plugin_setup:plugin");
    assert_eq!(entry.package, "q2_stats");
    assert_eq!(entry.actions.len(), 2);
    let wilcoxon = &entry.actions["wilcoxon_srt"];
    assert_eq!(wilcoxon.inputs[0].semantic_type, "Dist1D[Ordered, Matched]");
    assert!(wilcoxon.parameters.iter().any(|p| p.name == "ignore_empty_comparator"));
}
