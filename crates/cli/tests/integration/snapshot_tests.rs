//! Integration tests for `wikimap snapshots` and `wikimap show`.

#![cfg(unix)]

use predicates::prelude::*;
use serde_json::Value;

use super::common::TestEnv;

#[test]
fn snapshots_lists_each_run() {
  let env = TestEnv::from_fixture("pipeline.json");
  env.run().assert().success();
  env.run().assert().success();

  let output = env.cmd().args(["snapshots", "-o", "json"]).output().unwrap();
  assert!(output.status.success());
  let items: Value = serde_json::from_slice(&output.stdout).unwrap();
  let items = items.as_array().unwrap();

  assert_eq!(items.len(), 2);
  assert_eq!(items[0]["index"], 0);
  assert_eq!(items[1]["is_latest"], true);
  assert_eq!(items[1]["jobs"], 3);
}

#[test]
fn snapshots_on_empty_archive() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .cmd()
    .arg("snapshots")
    .assert()
    .success()
    .stdout(predicate::str::contains("No snapshots"));
}

#[test]
fn show_prints_configuration_record() {
  let env = TestEnv::from_fixture("pipeline.json");
  env.run().args(["-c", "SRC.word=bye"]).assert().success();

  let output = env.cmd().args(["show", "0", "-o", "json"]).output().unwrap();
  assert!(output.status.success());
  let config: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(config["SOURCE"]["word"], "bye");
  assert_eq!(config["STAMP"]["copies"], 1);

  env
    .cmd()
    .args(["show", "0"])
    .assert()
    .success()
    .stdout(predicate::str::contains("word = bye"))
    .stdout(predicate::str::contains("JOB NAME"));
}

#[test]
fn show_missing_snapshot_fails() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .cmd()
    .args(["show", "4"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("snapshot 4 does not exist"));
}
