//! Reuse and invalidation across consecutive runs.

use std::fs;

use wikimap_lib::job::{ConfigValue, Job, Outcome};
use wikimap_lib::path::AbstractPath;
use wikimap_lib::registry::JobRegistry;

use super::common::{TestArchive, concat, diamond_registry, outcomes};

#[test]
fn first_run_executes_every_job() {
  let archive = TestArchive::new();
  let (_, report) = archive.run_all(&diamond_registry(), &[]);

  assert!(report.is_success());
  assert_eq!(report.build_dir, archive.snapshot(0));
  assert_eq!(outcomes(&report), vec!["A=SUCCESS", "B=SUCCESS", "C=SUCCESS", "D=SUCCESS"]);
  assert_eq!(fs::read_to_string(archive.snapshot(0).join("b/b.txt")).unwrap(), "AB");
  assert_eq!(fs::read_to_string(archive.snapshot(0).join("c.txt")).unwrap(), "AC");
}

#[test]
fn identical_rerun_skips_everything_and_links_artifacts() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let (_, report) = archive.run_all(&registry, &[]);

  assert!(report.is_success());
  assert_eq!(report.build_dir, archive.snapshot(1));
  assert_eq!(report.summary.count(Outcome::Skipped), 4);
  for relative in ["a.txt", "b/b.txt", "c.txt", "d.txt"] {
    let old = archive.snapshot(0).join(relative);
    let new = archive.snapshot(1).join(relative);
    assert_eq!(fs::read(&old).unwrap(), fs::read(&new).unwrap());
    #[cfg(unix)]
    assert!(super::common::same_file(&old, &new), "{relative} was not hard linked");
  }

  let record = archive.store().load_config(&archive.snapshot(1)).unwrap();
  assert_eq!(record.len(), 4);
}

#[test]
fn upstream_config_change_reruns_dependents_only() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let (_, report) = archive.run_all(&registry, &[("a.tag", ConfigValue::from("Z"))]);

  assert_eq!(outcomes(&report), vec!["A=SUCCESS", "B=SUCCESS", "C=SUCCESS", "D=SKIPPED"]);
  assert_eq!(fs::read_to_string(archive.snapshot(1).join("b/b.txt")).unwrap(), "ZB");

  let record = archive.store().load_config(&archive.snapshot(1)).unwrap();
  assert_eq!(record.get("A").unwrap().get("tag"), Some(&ConfigValue::from("Z")));
}

#[test]
fn leaf_config_change_reruns_that_job_alone() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let (_, report) = archive.run_all(&registry, &[("B.tag", ConfigValue::from("Y"))]);

  assert_eq!(outcomes(&report), vec!["A=SKIPPED", "B=SUCCESS", "C=SKIPPED", "D=SKIPPED"]);
  assert_eq!(fs::read_to_string(archive.snapshot(1).join("b/b.txt")).unwrap(), "AY");
}

#[test]
fn reverting_config_compares_against_latest_snapshot() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);
  archive.run_all(&registry, &[("d.tag", ConfigValue::from("X"))]);

  let (_, report) = archive.run_all(&registry, &[]);

  assert_eq!(report.summary.outcome_of("D"), Some(Outcome::Success));
  assert_eq!(report.summary.count(Outcome::Skipped), 3);
}

#[test]
fn deleted_output_reruns_its_job_and_dependents() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);
  fs::remove_file(archive.snapshot(0).join("a.txt")).unwrap();

  let (_, report) = archive.run_all(&registry, &[]);

  assert_eq!(outcomes(&report), vec!["A=SUCCESS", "B=SUCCESS", "C=SUCCESS", "D=SKIPPED"]);
  assert!(archive.snapshot(1).join("a.txt").exists());
}

#[test]
fn explicit_base_snapshot_is_used_as_cache() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);
  archive.run_all(&registry, &[("a.tag", ConfigValue::from("Z"))]);

  let mut build = registry.build().unwrap();
  let everything = build.select("*").unwrap();
  build.plan(&everything, &Default::default()).unwrap();
  let report = archive.runner().with_base(0).run(&mut build).unwrap();

  assert_eq!(report.summary.count(Outcome::Skipped), 4);
  assert_eq!(report.build_dir, archive.snapshot(2));
  assert_eq!(fs::read_to_string(archive.snapshot(2).join("a.txt")).unwrap(), "A");
}

#[test]
fn missing_base_snapshot_creates_nothing() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let mut build = registry.build().unwrap();
  let err = archive.runner().with_base(7).run(&mut build).unwrap_err();

  assert!(err.to_string().contains('7'));
  assert!(!archive.snapshot(1).exists());
}

#[test]
fn shared_output_of_two_skipped_producers_survives_reuse() {
  let archive = TestArchive::new();
  let mut registry = JobRegistry::new();
  registry
    .register(|| Job::new("P1", concat).output(AbstractPath::new("shared", "shared.txt")).arg("tag", "one"))
    .register(|| Job::new("P2", concat).output(AbstractPath::new("shared", "shared.txt")).arg("tag", "two"));
  archive.run_all(&registry, &[]);
  assert_eq!(fs::read_to_string(archive.snapshot(0).join("shared.txt")).unwrap(), "two");

  let (_, report) = archive.run_all(&registry, &[]);

  assert_eq!(outcomes(&report), vec!["P1=SKIPPED", "P2=SKIPPED"]);
  assert_eq!(fs::read_to_string(archive.snapshot(0).join("shared.txt")).unwrap(), "two");
  assert_eq!(fs::read_to_string(archive.snapshot(1).join("shared.txt")).unwrap(), "two");
}
