//! Binary-level tests of the `dcmanager` executable.
//!
//! None of these reach a server: they cover argument parsing and the
//! failures raised before the first request.

use assert_cmd::Command;
use predicates::prelude::*;

fn dcmanager() -> Command {
    let mut cmd = Command::cargo_bin("dcmanager").expect("binary builds");
    cmd.env_clear();
    cmd
}

#[test]
fn help_lists_nouns() {
    dcmanager()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("subcloud-peer-group")
                .and(predicate::str::contains("peer-group-association"))
                .and(predicate::str::contains("sw-deploy-strategy"))
                .and(predicate::str::contains("strategy-config")),
        );
}

#[test]
fn strategy_help_lists_verbs() {
    dcmanager()
        .args(["kube-rootca-update-strategy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create").and(predicate::str::contains("abort")));
}

#[test]
fn missing_credentials_fail_before_any_request() {
    dcmanager()
        .args(["subcloud", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "You must provide a username via either --os-username or via env[OS_USERNAME]",
        ));
}

#[test]
fn token_without_url_fails() {
    dcmanager()
        .args(["--os-auth-token", "gAAAA", "alarm", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dcmanager-url"));
}

#[test]
fn unknown_noun_is_a_usage_error() {
    dcmanager()
        .args(["subclouds", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn removed_verb_still_parses() {
    // Rejected by the command itself, after credentials are checked.
    dcmanager()
        .args(["subcloud", "reconfig", "subcloud1"])
        .assert()
        .failure();
}

#[test]
fn deploy_phase_help_shows_only_its_flags() {
    dcmanager()
        .args(["subcloud", "deploy", "complete", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--bootstrap-values")
                .or(predicate::str::contains("--install-values"))
                .or(predicate::str::contains("--deploy-config"))
                .not(),
        );
}

#[test]
fn deploy_phase_rejects_foreign_flag_at_parse_time() {
    dcmanager()
        .args(["subcloud", "deploy", "abort", "s1", "--release", "24.09"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument '--release'"));
}
