//! Integration tests for `wikimap run` and `wikimap list`.

#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn first_run_builds_every_job() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .run()
    .assert()
    .success()
    .stdout(predicate::str::contains("[SUCCESS]"))
    .stdout(predicate::str::contains("3 run"))
    .stderr(predicate::str::contains("STARTING BUILD IN"));

  assert_eq!(env.read(0, "raw/word.txt"), "hello");
  assert_eq!(env.read(0, "upper.txt"), "HELLO");
  assert_eq!(env.read(0, "stamp.txt"), "stamp 1");
  assert!(env.snapshot(0).join("config").exists());
  assert!(env.snapshot(0).join("summary").exists());
}

#[test]
fn second_run_reuses_everything() {
  let env = TestEnv::from_fixture("pipeline.json");
  env.run().assert().success();

  env
    .run()
    .assert()
    .success()
    .stdout(predicate::str::contains("3 skipped"))
    .stdout(predicate::str::contains("[SUCCESS]").not());

  assert_eq!(env.read(1, "upper.txt"), "HELLO");
}

#[test]
fn config_override_reruns_dependents() {
  let env = TestEnv::from_fixture("pipeline.json");
  env.run().assert().success();

  env
    .run()
    .args(["-c", "SRC.word=bye"])
    .assert()
    .success()
    .stdout(predicate::str::contains("2 run, 1 skipped"));

  assert_eq!(env.read(1, "upper.txt"), "BYE");
  assert_eq!(env.read(1, "stamp.txt"), "stamp 1");
}

#[test]
fn out_of_range_override_is_rejected_before_running() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .run()
    .args(["-c", "STAMP.copies=9"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("copies"));

  assert!(!env.snapshot(0).exists());
}

#[test]
fn unknown_override_is_rejected() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .run()
    .args(["-c", "UP.nope=1"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("nope"));
}

#[test]
fn forced_job_reruns() {
  let env = TestEnv::from_fixture("pipeline.json");
  env.run().assert().success();

  env
    .run()
    .args(["-f", "STAMP"])
    .assert()
    .success()
    .stdout(predicate::str::contains("1 run, 2 skipped"));
}

#[test]
fn forced_and_skipped_job_fails_without_snapshot() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .run()
    .args(["-f", "UP", "-s", "UP"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("UPPER"));

  assert!(!env.archive().exists());
}

#[test]
fn failing_job_exits_with_failure() {
  let env = TestEnv::from_fixture("failing.json");

  env
    .run()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("[FAILURE]"))
    .stderr(predicate::str::contains("BROKEN failed"));

  assert_eq!(env.read(0, "first.txt"), "ok");
  assert!(!env.snapshot(0).join("second.txt").exists());
}

#[test]
fn list_shows_planned_jobs() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .cmd()
    .arg("list")
    .arg("-m")
    .arg(&env.manifest)
    .args(["-t", "UP"])
    .assert()
    .success()
    .stdout(predicate::str::contains("SOURCE"))
    .stdout(predicate::str::contains("UPPER"))
    .stdout(predicate::str::contains("STAMP").not());
}

#[test]
fn run_without_archive_root_fails() {
  let env = TestEnv::from_fixture("pipeline.json");

  env
    .run()
    .env_remove("WIKIMAP_BUILDPATH")
    .assert()
    .failure()
    .stderr(predicate::str::contains("WIKIMAP_BUILDPATH"));
}

#[test]
fn explicit_buildpath_and_prefix_flags() {
  let env = TestEnv::from_fixture("pipeline.json");
  let other = env.temp.path().join("elsewhere");

  env
    .run()
    .arg("-b")
    .arg(&other)
    .args(["-p", "snap"])
    .assert()
    .success();

  assert!(other.join("snap0/upper.txt").exists());
  assert!(!env.archive().exists());
}
