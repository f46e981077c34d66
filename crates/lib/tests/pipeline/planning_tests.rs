//! Target selection, forcing and skipping across runs.

use std::collections::BTreeSet;
use std::fs;

use wikimap_lib::build::BuildError;
use wikimap_lib::job::{ConfigValue, Outcome};
use wikimap_lib::plan::PlanError;

use super::common::{TestArchive, diamond_registry, outcomes};

fn names(build: &wikimap_lib::build::Build) -> Vec<&str> {
  build.iter().map(|job| job.name()).collect()
}

#[test]
fn target_pulls_in_its_producers_in_order() {
  let mut build = diamond_registry().build().unwrap();
  let targets = build.select("c").unwrap();

  build.plan(&targets, &BTreeSet::new()).unwrap();

  assert_eq!(names(&build), vec!["A", "C"]);
  assert_eq!(build.get(1).unwrap().position(), 1);
}

#[test]
fn range_targets_accept_names_and_aliases() {
  let mut build = diamond_registry().build().unwrap();
  let targets = build.select("b-C").unwrap();

  build.plan(&targets, &BTreeSet::new()).unwrap();

  assert_eq!(names(&build), vec!["A", "B", "C"]);
}

#[test]
fn forced_job_reruns_and_invalidates_dependents() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let mut build = registry.build().unwrap();
  let targets = build.select("*").unwrap();
  let forced = build.select("A").unwrap();
  build.plan(&targets, &forced).unwrap();
  let report = archive.runner().run(&mut build).unwrap();

  assert_eq!(outcomes(&report), vec!["A=SUCCESS", "B=SUCCESS", "C=SUCCESS", "D=SKIPPED"]);
}

#[test]
fn skipped_job_keeps_previous_outputs() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let mut build = registry.build().unwrap();
  let targets = build.select("*").unwrap();
  let skipped = build.select("a").unwrap();
  build.plan_with(&targets, &BTreeSet::new(), &skipped).unwrap();
  build
    .configure_flat(&[("A.tag".to_string(), ConfigValue::from("ignored"))].into_iter().collect())
    .unwrap();
  let report = archive.runner().run(&mut build).unwrap();

  assert_eq!(report.summary.outcome_of("A"), Some(Outcome::Skipped));
  assert_eq!(report.summary.count(Outcome::Skipped), 4);
  assert!(archive.snapshot(1).join("a.txt").exists());
}

#[test]
fn skipped_job_is_recorded_with_the_config_of_its_reused_outputs() {
  let archive = TestArchive::new();
  let registry = diamond_registry();
  archive.run_all(&registry, &[]);

  let mut build = registry.build().unwrap();
  let targets = build.select("*").unwrap();
  let skipped = build.select("a").unwrap();
  build.plan_with(&targets, &BTreeSet::new(), &skipped).unwrap();
  build
    .configure_flat(&[("a.tag".to_string(), ConfigValue::from("NEW"))].into_iter().collect())
    .unwrap();
  archive.runner().run(&mut build).unwrap();

  let record = archive.store().load_config(&archive.snapshot(1)).unwrap();
  assert_eq!(record.get("A").unwrap().get("tag"), Some(&ConfigValue::from("A")));

  let (_, report) = archive.run_all(&registry, &[("a.tag", ConfigValue::from("NEW"))]);

  assert_eq!(report.summary.outcome_of("A"), Some(Outcome::Success));
  assert_eq!(fs::read_to_string(archive.snapshot(2).join("a.txt")).unwrap(), "NEW");
  assert_eq!(fs::read_to_string(archive.snapshot(2).join("c.txt")).unwrap(), "NEWC");
}

#[test]
fn forced_and_skipped_fails_before_any_snapshot_exists() {
  let archive = TestArchive::new();
  let registry = diamond_registry();

  let mut build = registry.build().unwrap();
  let targets = build.select("*").unwrap();
  let both = build.select("B").unwrap();
  let err = build.plan_with(&targets, &both, &both).unwrap_err();

  assert!(matches!(err, BuildError::Plan(PlanError::ForcedAndSkipped(name)) if name == "B"));
  assert!(!archive.root().exists());
  assert!(archive.store().list().unwrap().is_empty());
}

#[test]
fn unknown_target_token_is_rejected() {
  let build = diamond_registry().build().unwrap();
  assert!(matches!(build.select("Q"), Err(PlanError::UnresolvedToken(_))));
}
