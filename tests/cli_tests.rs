//! Binary-level tests for local side effects of each command.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("config.yaml");
    std::fs::write(&config, "{}\n").expect("write config");

    Command::new(env!("CARGO_BIN_EXE_formflow-sync"))
        .current_dir(dir)
        .env_remove("FORMFLOW_CONFIG_PATH")
        .env_remove("FORMFLOW_DB_PATH")
        .env("FORMFLOW_TEST_TIMEOUT", "2")
        .arg("--log")
        .arg("0")
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("run formflow-sync")
}

#[test]
fn test_connection_leaves_no_database_behind() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("state").join("formflow.db");

    let output = run(
        dir.path(),
        &[
            "--database",
            db_path.to_str().unwrap(),
            "test-connection",
            "--token",
            "tok",
            "--url",
            "http://127.0.0.1:1",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[error] Action Failed: Connection failed"), "{}", stderr);
    assert!(!dir.path().join("state").exists());
    assert!(!dir.path().join(".formflow").exists());
}

#[test]
fn list_creates_the_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("state").join("formflow.db");

    let output = run(dir.path(), &["--database", db_path.to_str().unwrap(), "list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# Templates (0)"), "{}", stdout);
    assert!(db_path.is_file());
}
