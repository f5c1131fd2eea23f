//! CLI integration tests for the Spruce command-line interface.
//!
//! Every test runs in a scratch directory with `--config` pointing at it and
//! the service environment variables removed. Commands that need a store use
//! `--offline`, so nothing here touches the network.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SERVICE_ENV: &[&str] = &[
    "OPENAI_API_KEY",
    "QDRANT_URL",
    "QDRANT_API_KEY",
    "QDRANT_COLLECTION",
    "PISTON_URL",
    "SPRUCE_CONFIG_DIR",
    "RUST_LOG",
];

/// Get a command for the spruce binary, isolated in `dir`.
fn spruce(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spruce").unwrap();
    cmd.current_dir(dir).arg("--config").arg(dir);
    for var in SERVICE_ENV {
        cmd.env_remove(var);
    }
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("quotation"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("quote"))
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spruce"));
}

#[test]
fn test_schedule_requires_inquiry() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .arg("schedule")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<INQUIRY>"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .arg("bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_defaults_as_json() {
    let dir = TempDir::new().unwrap();
    let report = stdout_json(spruce(dir.path()).args(["--json", "config"]));

    assert_eq!(report["config"]["store"]["collection"], "spruce");
    assert_eq!(report["config"]["store"]["url"], "http://localhost:6333");
    assert_eq!(report["config"]["sandbox"]["language"], "python");
    assert_eq!(report["config"]["quotation"]["request"], "move-out cleaning");
    assert!(report["secrets"][0]["source"].is_null());
}

#[test]
fn test_config_redacts_plaintext_key() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[llm]\nmodel = \"gpt-4o\"\napi_key = \"sk-test-secret\"\n",
    )
    .unwrap();

    let mut cmd = spruce(dir.path());
    cmd.args(["--json", "config"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sk-test-secret").not());

    let report = stdout_json(&mut cmd);
    assert_eq!(report["config"]["llm"]["model"], "gpt-4o");
    assert_eq!(report["config"]["llm"]["api_key"], "********");
    assert_eq!(report["secrets"][0]["source"], "config file (plaintext)");
    assert!(!report["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_project_file_and_env_override() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("spruce.toml"),
        "[store]\ncollection = \"project\"\n",
    )
    .unwrap();

    let report = stdout_json(
        spruce(dir.path())
            .env("QDRANT_URL", "http://qdrant.internal:6333")
            .args(["--json", "config"]),
    );
    assert_eq!(report["config"]["store"]["collection"], "project");
    assert_eq!(report["config"]["store"]["url"], "http://qdrant.internal:6333");
    assert_eq!(report["env_overrides"][0], "QDRANT_URL");
}

#[test]
fn test_config_init_writes_defaults_once() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(written.contains("[sandbox]"));
    assert!(written.contains("collection = \"spruce\""));

    spruce(dir.path())
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    spruce(dir.path())
        .args(["config", "--init", "--force"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Offline Store Commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_offline_rules() {
    let dir = TempDir::new().unwrap();
    let rules = stdout_json(spruce(dir.path()).args(["--offline", "--json", "rules"]));

    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 3);
    assert!(rules.iter().any(|r| r == "No appointments on Sundays."));
}

#[test]
fn test_offline_search_excludes_rules() {
    let dir = TempDir::new().unwrap();
    let hits = stdout_json(spruce(dir.path()).args([
        "--offline",
        "--json",
        "search",
        "carpet cleaning",
        "-k",
        "8",
    ]));

    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 5);
    assert!(hits.iter().all(|h| h["scheduling_rule"] == false));
    assert_eq!(hits[0]["source"], "Mary Johnson");
}

#[test]
fn test_offline_search_with_rules() {
    let dir = TempDir::new().unwrap();
    let hits = stdout_json(spruce(dir.path()).args([
        "--offline",
        "--json",
        "search",
        "appointments on Sundays",
        "-k",
        "8",
        "--include-rules",
    ]));

    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 8);
    assert!(hits.iter().any(|h| h["scheduling_rule"] == true));
}

#[test]
fn test_offline_ingest_skips_seeded_collection() {
    let dir = TempDir::new().unwrap();
    let report = stdout_json(spruce(dir.path()).args(["--offline", "--json", "ingest"]));
    assert_eq!(report["skipped"], true);

    let report = stdout_json(spruce(dir.path()).args(["--offline", "--json", "ingest", "--force"]));
    assert_eq!(report["skipped"], false);
    assert_eq!(report["added"], 8);
}

#[test]
fn test_ingest_reports_bad_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("docs.json"), "{\"content\": \"no array\"}").unwrap();

    spruce(dir.path())
        .args(["--offline", "ingest", "--file", "docs.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("docs.json"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure Modes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_schedule_without_api_key() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .args(["--offline", "schedule", "Sunday at 10am"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_quote_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[llm]\ntemperature = 5.0\n",
    )
    .unwrap();

    spruce(dir.path())
        .args(["--offline", "quote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_run_missing_file() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .args(["run", "nope.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read nope.py"));
}

#[test]
fn test_run_empty_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("empty.py"), "\n").unwrap();
    spruce(dir.path())
        .args(["run", "empty.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is empty"));
}

#[test]
fn test_run_accepts_runtime_version() {
    let dir = TempDir::new().unwrap();
    spruce(dir.path())
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--runtime-version"));

    spruce(dir.path())
        .args(["run", "--language", "python", "--runtime-version", "3.10.0", "nope.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read nope.py"));
}
