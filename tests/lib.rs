//! End-to-end CLI smoke test, in the spirit of the unit tests spread
//! across `src/*.rs`'s `#[cfg(test)]` modules but exercising the compiled
//! binary itself.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_usage_with_help() {
    Command::cargo_bin("reposprout")
        .expect("binary builds")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrap orchestrator"));
}

#[test]
fn missing_fixture_argument_is_a_usage_error() {
    Command::cargo_bin("reposprout")
        .expect("binary builds")
        .assert()
        .failure();
}

#[test]
fn nonexistent_fixture_path_fails_with_a_readable_error() {
    Command::cargo_bin("reposprout")
        .expect("binary builds")
        .arg("/nonexistent/repo.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("repo fixture"));
}
