//! End-to-end CLI tests for the harvester binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LETTERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Letters</title></titleStmt>
      <publicationStmt>
        <publisher><ref target="https://example.org/archive">Example Archive</ref></publisher>
        <idno type="url">https://example.org/letters.xml</idno>
      </publicationStmt>
    </fileDesc>
    <profileDesc>
      <correspDesc ref="https://example.org/letter/1">
        <correspAction type="sent">
          <persName ref="http://d-nb.info/gnd/118540238">Johann Wolfgang von Goethe</persName>
          <date when="1805-05-01"/>
        </correspAction>
      </correspDesc>
    </profileDesc>
  </teiHeader>
</TEI>
"#;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Harvest a paginated metadata feed"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harvester"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_unknown_output_returns_error() {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.args(["feed.ttl", "-o", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pdf"));
}

#[test]
fn test_binary_without_start_location_fails() {
    let root = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.arg("--output-root")
        .arg(root.path())
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing start location"));
}

#[test]
fn test_binary_local_feed_run_writes_outputs() {
    let source = TempDir::new().unwrap();
    let feed = source.path().join("letters.xml");
    std::fs::write(&feed, LETTERS).unwrap();
    let root = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.arg(&feed)
        .args(["-d", "cmif", "-o", "beacon,csv", "-n", "letters"])
        .arg("--output-root")
        .arg(root.path())
        .args(["--delay-ms", "0", "--no-authority-cache", "-q"])
        .assert()
        .success();

    let run_dir = root.path().join("letters");
    let beacon = std::fs::read_to_string(run_dir.join("beacon.txt")).unwrap();
    assert!(beacon.contains("https://d-nb.info/gnd/118540238||https://example.org/letter/1"));
    assert!(run_dir.join("table.csv").is_file());
    assert!(run_dir.join("harvesting.log").is_file());
    assert!(!root.path().join("authorities.json").exists());
}

#[test]
fn test_binary_existing_run_directory_fails() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("taken")).unwrap();

    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.args(["feed.ttl", "-n", "taken", "-q"])
        .arg("--output-root")
        .arg(root.path())
        .assert()
        .failure();
}

#[test]
fn test_binary_missing_feed_exits_with_failure() {
    let root = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.arg(root.path().join("absent.ttl"))
        .args(["-n", "run", "--delay-ms", "0", "--no-authority-cache", "-q"])
        .arg("--output-root")
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Harvest failed"));
}
