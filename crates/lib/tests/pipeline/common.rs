//! Shared fixtures for pipeline integration tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wikimap_lib::build::Build;
use wikimap_lib::job::{ConfigValue, Job, JobContext, JobError};
use wikimap_lib::path::AbstractPath;
use wikimap_lib::registry::JobRegistry;
use wikimap_lib::runner::{BuildRunner, RunReport};
use wikimap_lib::store::BuildDirectoryStore;

/// Copy every input into every output, followed by the job's `tag` argument.
pub fn concat(ctx: &mut JobContext<'_>) -> Result<(), JobError> {
  let mut content = String::new();
  for input in ctx.inputs() {
    content.push_str(&fs::read_to_string(input)?);
  }
  if let Some(tag) = ctx.arg("tag") {
    content.push_str(&tag.to_string());
  }
  for output in ctx.outputs() {
    fs::write(output, &content)?;
  }
  Ok(())
}

/// `A(out=[a])`, `B(in=[a], out=[b])`, `C(in=[a], out=[c])` and an unrelated `D(out=[d])`.
pub fn diamond_registry() -> JobRegistry {
  let mut registry = JobRegistry::new();
  registry
    .register(|| {
      Job::new("A", concat)
        .alias("a")
        .output(AbstractPath::new("a", "a.txt"))
        .arg("tag", "A")
    })
    .register(|| {
      Job::new("B", concat)
        .alias("b")
        .input(AbstractPath::new("a", "a.txt"))
        .output(AbstractPath::new("b", "b/b.txt"))
        .arg("tag", "B")
    })
    .register(|| {
      Job::new("C", concat)
        .alias("c")
        .input(AbstractPath::new("a", "a.txt"))
        .output(AbstractPath::new("c", "c.txt"))
        .arg("tag", "C")
    })
    .register(|| {
      Job::new("D", concat)
        .alias("d")
        .output(AbstractPath::new("d", "d.txt"))
        .arg("tag", "D")
    });
  registry
}

/// Isolated archive root per test.
pub struct TestArchive {
  pub temp: TempDir,
}

impl TestArchive {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> PathBuf {
    self.temp.path().join("archive")
  }

  pub fn store(&self) -> BuildDirectoryStore {
    BuildDirectoryStore::new(self.root(), "build")
  }

  pub fn runner(&self) -> BuildRunner {
    BuildRunner::new(self.store())
  }

  pub fn snapshot(&self, index: usize) -> PathBuf {
    self.store().build_dir(index)
  }

  /// Plan every job, apply `overrides` and run.
  pub fn run_all(&self, registry: &JobRegistry, overrides: &[(&str, ConfigValue)]) -> (Build, RunReport) {
    let mut build = registry.build().unwrap();
    let everything = build.select("*").unwrap();
    build.plan(&everything, &Default::default()).unwrap();
    let flat: BTreeMap<String, ConfigValue> = overrides
      .iter()
      .map(|(key, value)| (key.to_string(), value.clone()))
      .collect();
    build.configure_flat(&flat).unwrap();
    let report = self.runner().run(&mut build).unwrap();
    (build, report)
  }
}

/// Outcome strings of every job, in order.
pub fn outcomes(report: &RunReport) -> Vec<String> {
  report
    .summary
    .jobs
    .iter()
    .map(|job| format!("{}={}", job.name, job.outcome))
    .collect()
}

#[cfg(unix)]
pub fn same_file(a: &Path, b: &Path) -> bool {
  use std::os::unix::fs::MetadataExt;
  let (a, b) = (fs::metadata(a).unwrap(), fs::metadata(b).unwrap());
  a.dev() == b.dev() && a.ino() == b.ino()
}
