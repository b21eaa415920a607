#![allow(deprecated)] // cargo_bin is deprecated in newer assert_cmd releases

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PROJECT: &str = r#"
name: contoso
services:
  chat:
    project: ./chat
    config:
      environment:
        name: env-${ENV:-dev}
        path: deployment/environment.yaml
  broken:
    config:
      environment:
        name: env-dev
        path: deployment/environment.yaml
      deployment:
        path: deployment/deployment.yaml
"#;

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fleetml.yaml"), PROJECT).unwrap();
    dir
}

/// Command isolated from the caller's Azure environment
fn fleetml(project: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fleetml").unwrap();
    cmd.current_dir(project.path())
        .env("FLEETML_CONFIG_PATH", project.path().join("fleetml.yaml"))
        .env("FLEETML_ENV", "ci")
        .env_remove("AZURE_SUBSCRIPTION_ID")
        .env_remove("AZURE_RESOURCE_GROUP")
        .env_remove("AZUREML_WORKSPACE_NAME")
        .env_remove("AZURE_ACCESS_TOKEN");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("fleetml").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provision versioned Azure ML resources"))
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("endpoint"))
        .stdout(predicate::str::contains("workspace"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("fleetml").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetml"));
}

#[test]
fn test_provision_help() {
    let mut cmd = Command::cargo_bin("fleetml").unwrap();
    cmd.arg("provision")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<SERVICE>"))
        .stdout(predicate::str::contains("--only"))
        .stdout(predicate::str::contains("--subscription"));
}

#[test]
fn test_provision_unknown_service() {
    let project = project();
    fleetml(&project)
        .args(["provision", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("service 'missing' is not defined"));
}

#[test]
fn test_provision_rejects_incomplete_deployment() {
    let project = project();
    fleetml(&project)
        .args(["provision", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing model"));
}

#[test]
fn test_provision_requires_subscription() {
    let project = project();
    fleetml(&project)
        .args(["provision", "chat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AZURE_SUBSCRIPTION_ID"));
}

#[test]
fn test_provision_only_unconfigured_kind() {
    let project = project();
    fleetml(&project)
        .args(["provision", "chat", "--only", "flow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to provision"));
}

#[test]
fn test_provision_rejects_unknown_kind() {
    let project = project();
    fleetml(&project)
        .args(["provision", "chat", "--only", "cluster"])
        .assert()
        .failure();
}

#[test]
fn test_scope_read_from_env_file() {
    let project = project();
    let env_dir = project.path().join(".fleetml").join("ci");
    fs::create_dir_all(&env_dir).unwrap();
    fs::write(
        env_dir.join(".env"),
        "AZURE_SUBSCRIPTION_ID=\"sub-123\"\n\
         AZURE_RESOURCE_GROUP=\"rg-ml\"\n\
         AZUREML_WORKSPACE_NAME=\"ws-ml\"\n",
    )
    .unwrap();

    // Scope resolves from the file; the missing interpreter stops the run
    // before any network traffic.
    fleetml(&project)
        .env("AZURE_ACCESS_TOKEN", "test-token")
        .env("FLEETML_PYTHON", "/nonexistent/python3")
        .env("FLEETML_SCRIPTS_DIR", project.path())
        .args(["workspace", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ws-ml"))
        .stderr(predicate::str::contains("tool bridge initialization failed"));
}
