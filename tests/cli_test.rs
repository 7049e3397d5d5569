//! CLI tests
//!
//! Run the real binary against the fixtures. Each test works in its own temp
//! directory so no aicodechecker.toml from the checkout leaks in.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_path().join(name).display().to_string()
}

/// Run the binary in `dir` with an isolated environment
fn run_in(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aicodechecker"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("AICODECHECKER_CORPUS")
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .stdin(Stdio::null())
        .output()
        .expect("Failed to run aicodechecker")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["analyze", "check", "corpus", "validate", "init"] {
        assert!(text.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_analyze_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        &dir,
        &[
            "analyze",
            &fixture("documented.py"),
            "--language",
            "python",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(json["label"], "ai");
    let score = json["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert_eq!(json["methods"][0]["name"], "heuristic");
    assert_eq!(json["metrics"]["function_count"], 3);
}

#[test]
fn test_analyze_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        &dir,
        &["analyze", &fixture("scrappy.py"), "--methods", "heuristic,weighted"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("HUMAN-WRITTEN"));
    assert!(text.contains("METHODS"));
}

#[test]
fn test_analyze_many_files_writes_array() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("results.json");
    let output = run_in(
        &dir,
        &[
            "analyze",
            &fixture("documented.py"),
            &fixture("scrappy.py"),
            "--format",
            "json",
            "--compact",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = std::fs::read_to_string(&out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["result"]["label"], "ai");
    assert_eq!(items[1]["result"]["label"], "human");
    assert!(items[1]["file"].as_str().unwrap().ends_with("scrappy.py"));
}

#[test]
fn test_analyze_rejects_unknown_language() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        &dir,
        &["analyze", &fixture("scrappy.py"), "--language", "cobol", "--format", "json"],
    );
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["error"]["kind"], "invalid_input");
}

#[test]
fn test_analyze_with_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        &dir,
        &[
            "analyze",
            &fixture("documented.py"),
            "--language",
            "python",
            "--corpus",
            &fixture("corpus.jsonl"),
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["likely_generator"], "gemini");
    let methods: Vec<&str> = json["methods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert!(methods.contains(&"dataset"));
}

#[test]
fn test_analyze_missing_corpus_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        &dir,
        &["analyze", &fixture("documented.py"), "--corpus", "nope.jsonl"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.jsonl"));
}

#[test]
fn test_check_reports_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["check", &fixture("broken.py"), "--language", "python", "--json"]);
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["ok"], false);
    assert!(!json["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_check_accepts_clean_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["check", &fixture("documented.py")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No syntax problems found"));
}

#[test]
fn test_disabled_dataset_method_is_announced() {
    let dir = tempfile::tempdir().unwrap();
    let checked = run_in(&dir, &["check", &fixture("documented.py")]);
    assert!(checked.status.success(), "stderr: {}", stderr(&checked));
    assert!(stderr(&checked).contains("dataset method disabled"));

    let analyzed = run_in(&dir, &["analyze", &fixture("documented.py"), "--format", "json"]);
    assert!(analyzed.status.success(), "stderr: {}", stderr(&analyzed));
    assert!(stderr(&analyzed).contains("dataset method disabled"));
    let json: serde_json::Value = serde_json::from_str(&stdout(&analyzed)).unwrap();
    let indicators = json["indicators"].as_array().unwrap();
    assert!(indicators
        .iter()
        .any(|i| i == "dataset: unavailable (disabled, no corpus configured)"));

    let with_corpus = run_in(
        &dir,
        &["analyze", &fixture("documented.py"), "--corpus", &fixture("corpus.jsonl")],
    );
    assert!(with_corpus.status.success(), "stderr: {}", stderr(&with_corpus));
    assert!(!stderr(&with_corpus).contains("dataset method disabled"));
}

#[test]
fn test_corpus_summary_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["corpus", &fixture("corpus.jsonl"), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["samples"], 6);
    assert_eq!(json["by_class"]["human"], 3);
    assert_eq!(json["by_class"]["gemini"], 2);
    assert_eq!(json["by_language"]["c"], 1);
}

#[test]
fn test_corpus_summary_reads_csv() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["corpus", &fixture("corpus.csv"), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["samples"], 7);
    assert_eq!(json["by_class"]["gemini"], 2);
    assert_eq!(json["by_class"]["human"], 3);
    assert_eq!(json["by_class"]["unknown"], 1);
}

#[test]
fn test_validate_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let args = [
        "validate",
        "--corpus",
        &fixture("corpus.jsonl"),
        "--samples",
        "4",
        "--seed",
        "7",
        "--json",
    ];
    let first = run_in(&dir, &args);
    let second = run_in(&dir, &args);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert_eq!(stdout(&first), stdout(&second));

    let json: serde_json::Value = serde_json::from_str(&stdout(&first)).unwrap();
    assert_eq!(json["evaluated"], 4);
    let accuracy = json["accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
}

#[test]
fn test_init_then_analyze_uses_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["init"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("aicodechecker.toml").exists());

    let again = run_in(&dir, &["init"]);
    assert!(!again.status.success());

    let analyzed = run_in(&dir, &["analyze", &fixture("scrappy.py"), "--format", "json"]);
    assert!(analyzed.status.success(), "stderr: {}", stderr(&analyzed));
}

#[test]
fn test_invalid_method_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(&dir, &["analyze", &fixture("scrappy.py"), "--methods", "magic"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("is not a method"));
}
