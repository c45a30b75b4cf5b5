//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

mod common;

use std::fs;

use assert_cmd::Command;
use common::*;
use predicates::prelude::*;

/// Get a command for the persona-engine binary
fn engine_cmd() -> Command {
    let mut cmd = Command::cargo_bin("persona-engine").unwrap();
    cmd.env_remove("PERSONA_ENGINE_CONFIG");
    cmd
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    engine_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona-engine"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version_command() {
    engine_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona-engine"))
        .stdout(predicate::str::contains("Build Information"))
        .stdout(predicate::str::contains("Git Hash"))
        .stdout(predicate::str::contains("Rules:"));
}

#[test]
fn test_short_version_flag() {
    engine_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona-engine"));
}

// ─────────────────────────────────────────────────────────────────
// Analyze Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_analyze_help() {
    engine_cmd()
        .arg("analyze")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--input"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn test_analyze_profile_to_stdout() {
    let output = engine_cmd()
        .arg("analyze")
        .arg("--input")
        .arg(profile_fixture())
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["subject"], "trail_runner");
    assert_eq!(record["summary"]["items_analyzed"], 7);
    assert!(record["traits"]["interests"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["label"] == "Outdoor Activities"));
}

#[test]
fn test_analyze_listing_from_stdin() {
    let listing = fs::read_to_string(listing_fixture()).unwrap();
    engine_cmd()
        .arg("analyze")
        .arg("--input")
        .arg("-")
        .arg("--compact")
        .write_stdin(listing)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""subject":"build_bot""#))
        .stdout(predicate::str::contains("Software Developer"));
}

#[test]
fn test_analyze_subject_override() {
    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .arg("--subject")
        .arg("someone_else")
        .arg("--compact")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""subject":"someone_else""#));
}

#[test]
fn test_analyze_parallel_matches_sequential() {
    let sequential = engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .output()
        .unwrap();
    let parallel = engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .arg("--parallel")
        .output()
        .unwrap();

    assert!(sequential.status.success());
    assert!(parallel.status.success());
    assert_eq!(sequential.stdout, parallel.stdout);
}

#[test]
fn test_analyze_writes_output_file() {
    let temp = TempFiles::new();
    let out = temp.path("persona.json");

    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Persona written to"))
        .stdout(predicate::str::contains("Fingerprint:"))
        .stdout(predicate::str::contains("Confidence:"));

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["summary"]["posts"], 4);
}

#[test]
fn test_analyze_with_custom_rules() {
    let temp = TempFiles::new();
    let input = temp.write(
        "sky.json",
        r#"{"username": "stargazer", "posts": [
            {"id": "a", "title": "Telescope upgrade", "selftext": "", "subreddit": "astronomy", "score": 3, "created_utc": 1714550400},
            {"id": "b", "title": "Orion nebula tonight", "selftext": "", "subreddit": "astronomy", "score": 8, "created_utc": 1714636800}
        ]}"#,
    );

    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&input)
        .arg("--rules")
        .arg(custom_rules_fixture())
        .arg("--compact")
        .assert()
        .success()
        .stdout(predicate::str::contains("Astronomy"));
}

#[test]
fn test_analyze_posts_limit() {
    let output = engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .arg("--posts-limit")
        .arg("1")
        .arg("--comments-limit")
        .arg("0")
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["summary"]["items_analyzed"], 1);
}

#[test]
fn test_analyze_missing_input() {
    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg("/nonexistent/profile.json")
        .assert()
        .failure()
        .code(30)
        .stderr(predicate::str::contains("Error ["));
}

#[test]
fn test_analyze_malformed_input() {
    let temp = TempFiles::new();
    let input = temp.write("broken.json", "{ not json");

    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&input)
        .assert()
        .failure()
        .code(30);
}

#[test]
fn test_analyze_duplicate_ids_rejected() {
    let temp = TempFiles::new();
    let input = temp.write(
        "dupes.json",
        r#"{"posts": [
            {"id": "x", "title": "One", "subreddit": "pics", "created_utc": 1714550400},
            {"id": "x", "title": "Two", "subreddit": "pics", "created_utc": 1714550401}
        ]}"#,
    );

    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&input)
        .assert()
        .failure()
        .code(30)
        .stderr(predicate::str::contains("duplicate id"));
}

#[test]
fn test_analyze_invalid_rules() {
    let temp = TempFiles::new();
    let rules = temp.write("bad_rules.toml", "[[labels]]\ndimension = \"interests\"\nlabel = \"\"\ndescription = \"x\"\nkeywords = [\"a\"]\n");

    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .arg("--rules")
        .arg(&rules)
        .assert()
        .failure()
        .code(50);
}

#[test]
fn test_analyze_with_invalid_config() {
    engine_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .arg("--config")
        .arg("/nonexistent/config.toml")
        .assert()
        .failure()
        .code(10);
}

// ─────────────────────────────────────────────────────────────────
// Rules Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_rules_show_bundled() {
    engine_cmd()
        .arg("rules")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("[[labels]]"))
        .stdout(predicate::str::contains("[[axes]]"))
        .stdout(predicate::str::contains("Outdoor Activities"));
}

#[test]
fn test_rules_validate_custom() {
    engine_cmd()
        .arg("rules")
        .arg("validate")
        .arg(custom_rules_fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Rule table is valid: 1 labels, 1 axes"));
}

#[test]
fn test_rules_init_then_validate() {
    let temp = TempFiles::new();
    let path = temp.path("rules.toml");

    engine_cmd()
        .arg("rules")
        .arg("init")
        .arg("--path")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rule table created"));

    engine_cmd()
        .arg("rules")
        .arg("init")
        .arg("--path")
        .arg(&path)
        .assert()
        .failure();

    engine_cmd()
        .arg("rules")
        .arg("validate")
        .arg(&path)
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_fixture() {
    engine_cmd()
        .arg("config")
        .arg("show")
        .arg("--config")
        .arg(valid_config_fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("[analysis]"))
        .stdout(predicate::str::contains("top_k = 2"))
        .stdout(predicate::str::contains("[input]"))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn test_config_validate_nonexistent_file() {
    engine_cmd()
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg("/nonexistent/path/config.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_init_help() {
    engine_cmd()
        .arg("config")
        .arg("init")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialize"))
        .stdout(predicate::str::contains("--path"))
        .stdout(predicate::str::contains("--force"));
}

// ─────────────────────────────────────────────────────────────────
// Verbosity Flag Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_verbose_flag() {
    engine_cmd().arg("-v").arg("version").assert().success();
}

#[test]
fn test_quiet_flag() {
    engine_cmd().arg("--quiet").arg("version").assert().success();
}

#[test]
fn test_verbose_analyze_keeps_stdout_clean() {
    let output = engine_cmd()
        .arg("-vv")
        .arg("analyze")
        .arg("-i")
        .arg(profile_fixture())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(serde_json::from_slice::<serde_json::Value>(&output.stdout).is_ok());
}

// ─────────────────────────────────────────────────────────────────
// Error Handling Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_command() {
    engine_cmd()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_subcommand() {
    engine_cmd().assert().failure();
}
