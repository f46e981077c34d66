//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Isolated archive per test.
pub struct TestEnv {
  pub temp: TempDir,
  pub manifest: PathBuf,
}

impl TestEnv {
  pub fn from_fixture(name: &str) -> Self {
    Self {
      temp: TempDir::new().unwrap(),
      manifest: fixture_path(name),
    }
  }

  pub fn archive(&self) -> PathBuf {
    self.temp.path().join("archive")
  }

  pub fn snapshot(&self, index: usize) -> PathBuf {
    self.archive().join(format!("build{}", index))
  }

  pub fn read(&self, index: usize, relative: &str) -> String {
    std::fs::read_to_string(self.snapshot(index).join(relative)).unwrap()
  }

  /// A `wikimap` command pointed at this test's archive.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("wikimap");
    cmd
      .env("WIKIMAP_BUILDPATH", self.archive())
      .env_remove("WIKIMAP_BUILD_PREFIX")
      .env("RUST_LOG", "info");
    cmd
  }

  pub fn run(&self) -> Command {
    let mut cmd = self.cmd();
    cmd.arg("run").arg("-m").arg(&self.manifest);
    cmd
  }
}
