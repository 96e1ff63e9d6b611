use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("tracker.yaml");
    let yaml = format!(
        r#"
run_id: "cli"
rules:
  deck_size: 3
  victory_threshold: 20
evidence:
  min_occurrences: 1
merge_window: 2
outputs:
  events_jsonl: "{events}"
  snapshot_json: "{snapshot}"
logging:
  tracing_level: "warn"
"#,
        events = dir.join("events.jsonl").display(),
        snapshot = dir.join("snapshot.json").display(),
    );
    fs::write(&path, yaml).expect("write config");
    path
}

fn write_detections(dir: &Path, steps: &[&[&str]]) -> std::path::PathBuf {
    let path = dir.join("detections.jsonl");
    let mut log = String::new();
    for step in steps {
        let frame: Vec<String> = step
            .iter()
            .map(|label| format!(r#"{{"name": "{label}", "confidence": 0.9, "xmin": 10}}"#))
            .collect();
        let line = format!("[{}]\n", frame.join(", "));
        log.push_str(&line);
        log.push_str(&line);
    }
    fs::write(&path, log).expect("write detections");
    path
}

#[test]
fn announces_the_winner() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path());
    let detections = write_detections(
        dir.path(),
        &[
            &["9C"],
            &["10C"],
            &["JC"],
            &[],
            &["10H"],
            &["10H", "AH"],
            &["10H", "AH", "JS"],
            &[],
        ],
    );

    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .arg("--detections")
        .arg(&detections)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Player 1 won the game of Russian Schnapsen!",
        ));

    let snapshot = fs::read_to_string(dir.path().join("snapshot.json")).expect("snapshot");
    assert!(snapshot.contains("\"phase\": \"ENDED\""));
}

#[test]
fn prints_standings_when_nobody_has_won() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path());
    let detections = write_detections(dir.path(), &[&["9C"], &["10C"], &["JC"], &[]]);
    let events = dir.path().join("custom").join("log.jsonl");

    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .arg("-c")
        .arg(&config)
        .arg("-d")
        .arg(&detections)
        .arg("--events-out")
        .arg(&events)
        .args(["--verbose", "silent"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Player 0 leads")
                .and(predicate::str::contains(
                    "Standings: Player 0: 0, Player 1: 0, Player 2: 0",
                )),
        );

    let log = fs::read_to_string(&events).expect("events written to override path");
    assert!(log.contains("\"bidding_skipped\""));
}

#[cfg(unix)]
#[test]
fn events_out_accepts_non_utf8_paths() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path());
    let detections = write_detections(dir.path(), &[&["9C"], &["10C"]]);
    let events = dir.path().join(OsStr::from_bytes(b"caf\xe9.jsonl"));

    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .arg("-c")
        .arg(&config)
        .arg("-d")
        .arg(&detections)
        .arg("--events-out")
        .arg(&events)
        .args(["--verbose", "silent"])
        .assert()
        .success();

    let log = fs::read_to_string(&events).expect("events written under the exact name");
    assert!(log.contains("\"card_dealt\""));
    assert!(!dir.path().join("events.jsonl").exists());
}

#[test]
fn structural_errors_exit_non_zero() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path());
    let detections = write_detections(
        dir.path(),
        &[
            &["9C"],
            &["10C"],
            &["JC"],
            &[],
            &["10H"],
            &["10H", "AH"],
            &["10H", "AH", "JS"],
            &["10H", "AH", "JS", "9S"],
            &[],
        ],
    );

    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .arg("--detections")
        .arg(&detections)
        .assert()
        .failure()
        .stderr(predicate::str::contains("game stopped at tick 9"));
}

#[test]
fn validate_only_reads_no_frames() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path());

    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation-only mode"));
    assert!(!dir.path().join("events.jsonl").exists());
}

#[test]
fn simulate_runs_a_synthetic_deal() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path());

    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .args(["--simulate", "--seed", "3", "--merge-window", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulated deal (seed 3)"));
}

#[test]
fn detections_and_simulate_are_exclusive() {
    Command::cargo_bin("schnapsen-tracker")
        .expect("binary built")
        .args(["--detections", "frames.jsonl", "--simulate"])
        .assert()
        .failure();
}
