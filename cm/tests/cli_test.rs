//! CLI tests for the `cm` binary
//!
//! Only commands that never reach a model are exercised here.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SETUP_PLAN: &str = "# Development Plan\n\nA habit tracker CLI.\n\n# Work Packages\n\n\
                          ## WP001: Setup\n\n- [ ] WP001-A: Init repo\n- [ ] WP001-B: Add CI\n\n\
                          ## WP002: Core\n\n- [ ] WP002-A: Store habits\n\n";

/// Write a config that keeps every path inside `root`
fn write_config(root: &Path) -> std::path::PathBuf {
    let config = format!(
        r#"log-level: debug
llm:
  default: local-gemma3
  backends:
    - name: local-gemma3
      provider: ollama
      model: gemma3:12b
    - name: gpt-4o
      provider: openai
      model: gpt-4o
      api-key-env: CONTEXTMGR_CLI_TEST_UNSET_KEY
  routing:
    planner: [local-llama3, gpt-4o]
paths:
  plans: {root}/plans
  context: {root}/context
  prompts: {root}/prompts
"#,
        root = root.display()
    );
    let path = root.join("contextmgr.yml");
    fs::write(&path, config).unwrap();
    path
}

fn cm(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cm").unwrap();
    cmd.env("XDG_DATA_HOME", root.join("share"))
        .env("NO_COLOR", "1")
        .env("HOME", root)
        .env_remove("PLANNER_MODEL")
        .env_remove("CODER_MODEL")
        .env_remove("REVIEWER_MODEL");
    cmd
}

#[test]
fn test_show_prints_plan_with_ids() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let plan_path = temp.path().join("plan.md");
    fs::write(&plan_path, SETUP_PLAN).unwrap();

    cm(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("show")
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("A habit tracker CLI."))
        .stdout(predicate::str::contains("WP001:"))
        .stdout(predicate::str::contains("WP001-B:"))
        .stdout(predicate::str::contains("Add CI"))
        .stdout(predicate::str::contains("Store habits"));
}

#[test]
fn test_show_json() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let plan_path = temp.path().join("plan.md");
    fs::write(&plan_path, SETUP_PLAN).unwrap();

    let output = cm(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["show", "--format", "json"])
        .arg(&plan_path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["overview"], "A habit tracker CLI.");
    assert_eq!(value["work_packages"][0]["tasks"][1], "Add CI");
    assert_eq!(value["work_packages"][1]["title"], "Core");
}

#[test]
fn test_show_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    cm(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["show", "does-not-exist.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read plan"));
}

#[test]
fn test_history_lists_newest_first() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let plans = temp.path().join("plans");
    fs::create_dir_all(&plans).unwrap();
    fs::write(plans.join("plan-20240101-090000.md"), SETUP_PLAN).unwrap();
    fs::write(plans.join("plan-20240102-090000.md"), SETUP_PLAN).unwrap();

    let output = cm(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("history")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let newer = stdout.find("plan-20240102-090000.md").unwrap();
    let older = stdout.find("plan-20240101-090000.md").unwrap();
    assert!(newer < older);
    assert!(stdout.contains("2 WPs, 3 tasks"));
}

#[test]
fn test_history_empty() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    cm(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No plans"));
}

#[test]
fn test_backends_reports_skipped_and_routing() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    cm(temp.path())
        .env_remove("CONTEXTMGR_CLI_TEST_UNSET_KEY")
        .arg("--config")
        .arg(&config)
        .arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("local-gemma3"))
        .stdout(predicate::str::contains("CONTEXTMGR_CLI_TEST_UNSET_KEY"))
        // planner prefers local-llama3 and gpt-4o, neither live, so the default serves it
        .stdout(predicate::str::is_match(r"planner\s+local-gemma3").unwrap());
}

#[test]
fn test_search_empty_index() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    cm(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["search", "habit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches."));
}

#[test]
fn test_brief_rejects_malformed_answer() {
    let temp = TempDir::new().unwrap();

    cm(temp.path())
        .args(["brief", "An app", "--answer", "no-separator"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ID=ANSWER"));
}
