use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("covid-tracker").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("covid-tracker"))
        .stdout(predicate::str::contains("countries"));
}

#[test]
fn last_update_reads_preferences() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("preferences.json"),
        r#"{"LastUpdate":"Last update 01.06.20 09:15"}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("covid-tracker").unwrap();
    cmd.arg("--cache-dir").arg(dir.path()).arg("last-update");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Last update 01.06.20 09:15"));
}

#[test]
fn offline_world_falls_back_to_cache_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("worldStatistics.json"),
        r#"{"confirmed":1234567,"recovered":2,"deaths":1}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("covid-tracker").unwrap();
    cmd.env("COVID_TRACKER_BRIEF_URL", "http://127.0.0.1:9/brief")
        .arg("--cache-dir")
        .arg(dir.path())
        .arg("world");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\u{26a0}"))
        .stdout(predicate::str::contains("1,234,567"));
}

// Live test (opt-in): cargo test --features online
#[cfg(feature = "online")]
#[test]
fn fetch_online_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("covid-tracker").unwrap();
    cmd.arg("--cache-dir")
        .arg(dir.path())
        .args(["countries", "--top", "5"]);
    cmd.assert().success();
}
