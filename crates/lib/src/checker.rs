//! Runtime verification of declared job dependencies.
//!
//! A [`VerificationScope`] is opened for every job run, seeded with the job's
//! resolved inputs and outputs. The job body records each path it touches
//! through its [`crate::job::JobContext`]. Closing the scope compares the two
//! sets and yields a [`DependencyReport`]; nothing here ever fails a job.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Declared versus requested paths of a single job run.
#[derive(Debug)]
pub struct VerificationScope {
  job_name: String,
  declared: BTreeSet<PathBuf>,
  requested: BTreeSet<PathBuf>,
}

impl VerificationScope {
  pub fn open(job_name: impl Into<String>, declared: impl IntoIterator<Item = PathBuf>) -> Self {
    Self {
      job_name: job_name.into(),
      declared: declared.into_iter().collect(),
      requested: BTreeSet::new(),
    }
  }

  pub fn job_name(&self) -> &str {
    &self.job_name
  }

  /// Record a path as requested by the job body.
  pub fn record(&mut self, path: &Path) {
    self.requested.insert(path.to_path_buf());
  }

  pub fn requested(&self) -> impl Iterator<Item = &Path> {
    self.requested.iter().map(PathBuf::as_path)
  }

  /// Close the scope and compare the declared and requested sets.
  pub fn close(self) -> DependencyReport {
    let unexpected = self.requested.difference(&self.declared).cloned().collect();
    let missing = self.declared.difference(&self.requested).cloned().collect();
    DependencyReport {
      job_name: self.job_name,
      unexpected,
      missing,
    }
  }
}

/// Mismatches found when a verification scope closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
  pub job_name: String,
  /// Touched by the body but never declared.
  pub unexpected: Vec<PathBuf>,
  /// Declared but never touched.
  pub missing: Vec<PathBuf>,
}

impl DependencyReport {
  pub fn is_clean(&self) -> bool {
    self.unexpected.is_empty() && self.missing.is_empty()
  }

  /// One human-readable line per mismatch, naming the job and the path.
  pub fn log_lines(&self) -> Vec<String> {
    let unexpected = self
      .unexpected
      .iter()
      .map(|path| format!("Unspecified dependency of '{}': on {}", self.job_name, path.display()));
    let missing = self
      .missing
      .iter()
      .map(|path| format!("Unnecessary dependency of '{}': on {}", self.job_name, path.display()));
    unexpected.chain(missing).collect()
  }

  /// Emit every mismatch as a warning and return the same lines.
  pub fn emit(&self) -> Vec<String> {
    for path in &self.unexpected {
      warn!(job = %self.job_name, path = %path.display(), "undeclared dependency");
    }
    for path in &self.missing {
      warn!(job = %self.job_name, path = %path.display(), "declared dependency never used");
    }
    self.log_lines()
  }
}
