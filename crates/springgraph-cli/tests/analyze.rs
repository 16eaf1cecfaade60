use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn analyze_on_empty_tree_exits_zero() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("springgraph")
        .unwrap()
        .args(["analyze", "--project-name", "demo", "--clean"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("files: 0 total"));
}

#[test]
fn analyze_reports_parsed_beans_and_dependency_edge() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("UserController.java"),
        r#"
        @RestController
        class UserController {
            UserController(UserService userService) {}
        }
        "#,
    )
    .unwrap();
    fs::write(dir.path().join("UserService.java"), "@Service class UserService {}").unwrap();

    Command::cargo_bin("springgraph")
        .unwrap()
        .args(["analyze", "--project-name", "demo", "--clean"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Bean: 2"))
        .stdout(predicate::str::contains("DEPENDS_ON: 1"));
}

#[test]
fn analyze_missing_root_exits_with_config_error() {
    Command::cargo_bin("springgraph")
        .unwrap()
        .args(["analyze", "--project-name", "demo"])
        .arg("/nonexistent/path/for/springgraph-cli-test")
        .assert()
        .code(2);
}

#[test]
fn analyze_clean_and_update_together_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("springgraph")
        .unwrap()
        .args(["analyze", "--project-name", "demo", "--clean", "--update"])
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn analyze_supports_json_output() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("springgraph")
        .unwrap()
        .args(["analyze", "--project-name", "demo", "--clean", "--json"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exit_code\": 0"));
}

#[test]
fn sequence_subcommand_is_a_reserved_stub() {
    Command::cargo_bin("springgraph").unwrap().arg("sequence").assert().code(2);
}

#[test]
fn db_only_scope_skips_java_sources() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("UserService.java"), "@Service class UserService {}").unwrap();

    Command::cargo_bin("springgraph")
        .unwrap()
        .args(["analyze", "--project-name", "demo", "--clean", "--db-object"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("files: 0 total"));
}
