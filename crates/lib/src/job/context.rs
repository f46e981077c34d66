//! What a job body sees while it executes.

use std::path::{Path, PathBuf};

use crate::checker::VerificationScope;
use crate::interrupt::Interrupt;
use crate::path::AbstractPath;

use super::{ConfigValue, JobConfig, JobError};

/// Execution context handed to [`super::JobBody::execute`].
///
/// Path accessors record what they return against the job's verification
/// scope. A body that builds paths by hand should call [`record`](Self::record)
/// for each one it touches.
pub struct JobContext<'a> {
  job_name: &'a str,
  build_dir: &'a Path,
  config: &'a JobConfig,
  inputs: &'a [PathBuf],
  outputs: &'a [PathBuf],
  scope: &'a mut VerificationScope,
  interrupt: &'a Interrupt,
}

impl<'a> JobContext<'a> {
  pub fn new(
    job_name: &'a str,
    build_dir: &'a Path,
    config: &'a JobConfig,
    inputs: &'a [PathBuf],
    outputs: &'a [PathBuf],
    scope: &'a mut VerificationScope,
    interrupt: &'a Interrupt,
  ) -> Self {
    Self {
      job_name,
      build_dir,
      config,
      inputs,
      outputs,
      scope,
      interrupt,
    }
  }

  pub fn job_name(&self) -> &str {
    self.job_name
  }

  /// The snapshot directory this run writes into.
  pub fn build_dir(&self) -> &Path {
    self.build_dir
  }

  pub fn config(&self) -> &JobConfig {
    self.config
  }

  pub fn arg(&self, name: &str) -> Option<&ConfigValue> {
    self.config.get(name)
  }

  /// The `index`-th declared input, resolved.
  pub fn input(&mut self, index: usize) -> Option<PathBuf> {
    let path = self.inputs.get(index)?.clone();
    self.scope.record(&path);
    Some(path)
  }

  /// The `index`-th declared output, resolved.
  pub fn output(&mut self, index: usize) -> Option<PathBuf> {
    let path = self.outputs.get(index)?.clone();
    self.scope.record(&path);
    Some(path)
  }

  pub fn inputs(&mut self) -> Vec<PathBuf> {
    for path in self.inputs {
      self.scope.record(path);
    }
    self.inputs.to_vec()
  }

  pub fn outputs(&mut self) -> Vec<PathBuf> {
    for path in self.outputs {
      self.scope.record(path);
    }
    self.outputs.to_vec()
  }

  /// Resolve an arbitrary abstract path, against `base` or this run's build directory.
  pub fn resolve(&mut self, path: &AbstractPath, base: Option<&Path>) -> PathBuf {
    let resolved = path.resolve(base.unwrap_or(self.build_dir));
    self.scope.record(&resolved);
    resolved
  }

  pub fn record(&mut self, path: &Path) {
    self.scope.record(path);
  }

  pub fn check_interrupt(&self) -> Result<(), JobError> {
    self.interrupt.check()
  }

  pub fn interrupt(&self) -> &Interrupt {
    self.interrupt
  }
}
