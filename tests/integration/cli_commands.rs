//! Integration tests for the chainderive binary.
//!
//! Drives the compiled CLI with an isolated config directory so the user's
//! global configuration cannot leak in.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(test_dir: &TempDir, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_chainderive");
    Command::new(bin)
        .env("HOME", test_dir.path().join("home"))
        .env("XDG_CONFIG_HOME", test_dir.path())
        .env_remove("CHAINDERIVE_LOG")
        .env_remove("CHAINDERIVE_LOG_OUTPUT")
        .arg("--quiet")
        .args(args)
        .output()
        .unwrap()
}

fn write_context(dir: &Path) -> String {
    let path = dir.join("kusama.toml");
    std::fs::write(
        &path,
        r#"
runtime_name = "kusama"
query_keys = ["system", "staking", "society", "generalCouncil"]

[instances.kusama]
council = ["generalCouncil"]
"#,
    )
    .unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_groups_text_output() {
    let test_dir = TempDir::new().unwrap();
    let context = write_context(test_dir.path());

    let output = run(&test_dir, &["groups", "--context", &context]);
    assert!(
        output.status.success(),
        "groups should succeed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Runtime: kusama"));
    let line = |group: &str| {
        stdout
            .lines()
            .find(|l| l.split_whitespace().next() == Some(group))
            .unwrap_or_else(|| panic!("no line for {group}"))
            .to_string()
    };
    assert!(line("society").contains("included"));
    assert!(line("council").contains("instance 'generalCouncil' of 'council'"));
    assert!(line("treasury").contains("excluded"));
    assert!(line("balances").contains("always available"));
}

#[test]
fn test_groups_json_included_only() {
    let test_dir = TempDir::new().unwrap();
    let context = write_context(test_dir.path());

    let output = run(
        &test_dir,
        &["groups", "--context", &context, "--included-only", "--format", "json"],
    );
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let groups: Vec<&str> = value["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["group"].as_str().unwrap())
        .collect();
    assert_eq!(
        groups,
        vec![
            "accounts",
            "balances",
            "bounties",
            "chain",
            "council",
            "elections",
            "society",
            "staking",
            "tx"
        ]
    );
}

#[test]
fn test_rules_respects_config_file() {
    let test_dir = TempDir::new().unwrap();
    let config = test_dir.path().join("custom.toml");
    std::fs::write(
        &config,
        r#"
[[availability]]
group = "myPallet"
required_keys = ["myPallet"]
use_instance_detection = true
"#,
    )
    .unwrap();

    let output = run(
        &test_dir,
        &["--config", config.to_str().unwrap(), "rules"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with("myPallet"))
        .expect("override should be listed");
    assert!(line.contains("[instance detection]"));
    assert!(stdout.lines().any(|l| l.starts_with("treasury")));
}

#[test]
fn test_missing_context_fails() {
    let test_dir = TempDir::new().unwrap();
    let missing = test_dir.path().join("absent.toml");

    let output = run(&test_dir, &["groups", "--context", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load chain context"));
}
