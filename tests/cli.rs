use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("mediagrab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("deliver"));
}

#[test]
fn process_requires_a_url() {
    Command::cargo_bin("mediagrab")
        .unwrap()
        .arg("process")
        .assert()
        .failure();
}

#[test]
fn process_rejects_unknown_type() {
    Command::cargo_bin("mediagrab")
        .unwrap()
        .args(["process", "https://example.com/watch?v=abc", "--type", "subtitle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
