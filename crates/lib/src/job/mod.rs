//! Jobs: named, independently cacheable units of work.

mod body;
mod config;
mod context;
mod types;

pub use body::JobBody;
pub use config::{ArgSpec, BuildConfig, ConfigError, ConfigValue, JobConfig, ValueKind};
pub use context::JobContext;
pub use types::{JobError, JobProperties, Outcome};

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::checker::VerificationScope;
use crate::guard::CompletionGuard;
use crate::interrupt::Interrupt;
use crate::path::{AbstractPath, PathGroup};

/// A named unit of work with declared inputs, outputs, arguments and a body.
///
/// Declarations are fixed once the job is assembled and configured. The
/// outcome, duration and log are reset and rewritten by every `run`/`skip`.
#[derive(Clone)]
pub struct Job {
  name: String,
  alias: Option<String>,
  position: usize,
  inputs: PathGroup,
  outputs: PathGroup,
  args: Vec<ArgSpec>,
  config: JobConfig,
  overridden: BTreeSet<String>,
  properties: JobProperties,
  outcome: Outcome,
  duration: Duration,
  log: Vec<String>,
  body: Arc<dyn JobBody>,
}

impl Job {
  pub fn new<F>(name: impl Into<String>, body: F) -> Self
  where
    F: Fn(&mut JobContext<'_>) -> Result<(), JobError> + Send + Sync + 'static,
  {
    Self::with_body(name, Arc::new(body))
  }

  pub fn with_body(name: impl Into<String>, body: Arc<dyn JobBody>) -> Self {
    Self {
      name: name.into(),
      alias: None,
      position: 0,
      inputs: PathGroup::new(),
      outputs: PathGroup::new(),
      args: Vec::new(),
      config: JobConfig::new(),
      overridden: BTreeSet::new(),
      properties: JobProperties::default(),
      outcome: Outcome::NotRun,
      duration: Duration::ZERO,
      log: Vec::new(),
      body,
    }
  }

  pub fn alias(mut self, alias: impl Into<String>) -> Self {
    self.alias = Some(alias.into());
    self
  }

  pub fn input(mut self, path: AbstractPath) -> Self {
    self.inputs.push(path);
    self
  }

  pub fn inputs(mut self, group: &PathGroup) -> Self {
    self.inputs = self.inputs.concat(group);
    self
  }

  pub fn output(mut self, path: AbstractPath) -> Self {
    self.outputs.push(path);
    self
  }

  pub fn outputs(mut self, group: &PathGroup) -> Self {
    self.outputs = self.outputs.concat(group);
    self
  }

  /// Declare an accepted argument with its default value.
  pub fn arg(self, name: impl Into<String>, default: impl Into<ConfigValue>) -> Self {
    self.arg_spec(ArgSpec::new(name, default))
  }

  pub fn arg_spec(mut self, spec: ArgSpec) -> Self {
    self.config.insert(spec.name.clone(), spec.default.clone());
    self.args.retain(|existing| existing.name != spec.name);
    self.args.push(spec);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn alias_name(&self) -> Option<&str> {
    self.alias.as_deref()
  }

  pub fn position(&self) -> usize {
    self.position
  }

  pub fn declared_inputs(&self) -> &PathGroup {
    &self.inputs
  }

  pub fn declared_outputs(&self) -> &PathGroup {
    &self.outputs
  }

  pub fn arg_specs(&self) -> &[ArgSpec] {
    &self.args
  }

  pub fn config(&self) -> &JobConfig {
    &self.config
  }

  /// Only the arguments set through [`configure`](Self::configure).
  pub fn custom_config(&self) -> JobConfig {
    self
      .config
      .iter()
      .filter(|(arg, _)| self.overridden.contains(*arg))
      .map(|(arg, value)| (arg.clone(), value.clone()))
      .collect()
  }

  pub fn properties(&self) -> JobProperties {
    self.properties
  }

  pub fn outcome(&self) -> Outcome {
    self.outcome
  }

  pub fn duration(&self) -> Duration {
    self.duration
  }

  pub fn log(&self) -> &[String] {
    &self.log
  }

  pub fn resolved_inputs(&self, base: &Path) -> Vec<PathBuf> {
    self.inputs.resolve(base)
  }

  pub fn resolved_outputs(&self, base: &Path) -> Vec<PathBuf> {
    self.outputs.resolve(base)
  }

  pub(crate) fn set_position(&mut self, position: usize) {
    self.position = position;
  }

  pub(crate) fn properties_mut(&mut self) -> &mut JobProperties {
    &mut self.properties
  }

  /// Apply argument overrides.
  ///
  /// Every override is validated before any is applied, so a rejected call
  /// leaves the configuration untouched.
  pub fn configure(&mut self, overrides: &BTreeMap<String, ConfigValue>) -> Result<(), ConfigError> {
    let validated = self.validate_overrides(overrides)?;
    self.apply_validated(validated);
    Ok(())
  }

  pub(crate) fn validate_overrides(
    &self,
    overrides: &BTreeMap<String, ConfigValue>,
  ) -> Result<Vec<(String, ConfigValue)>, ConfigError> {
    overrides
      .iter()
      .map(|(arg, value)| {
        let spec = self
          .args
          .iter()
          .find(|spec| &spec.name == arg)
          .ok_or_else(|| ConfigError::UnknownArgument {
            job: self.name.clone(),
            arg: arg.clone(),
          })?;
        Ok((arg.clone(), spec.validate(&self.name, value)?))
      })
      .collect()
  }

  pub(crate) fn apply_validated(&mut self, validated: Vec<(String, ConfigValue)>) {
    for (arg, value) in validated {
      self.overridden.insert(arg.clone());
      self.config.insert(arg, value);
    }
  }

  /// Forget the result of any previous run.
  pub fn reset(&mut self) {
    self.outcome = Outcome::NotRun;
    self.duration = Duration::ZERO;
    self.log.clear();
  }

  /// Mark the job SKIPPED without invoking its body.
  pub fn skip(&mut self) {
    self.reset();
    self.outcome = Outcome::Skipped;
  }

  /// Execute the body against `build_dir`.
  ///
  /// Outputs are removed again unless the body returns `Ok`. A body error is
  /// returned after the outcome has been set to FAILURE, or ABORTED when the
  /// error is an interrupt. A panicking body is caught and fails the job.
  pub fn run(&mut self, build_dir: &Path, interrupt: &Interrupt) -> Result<(), JobError> {
    self.reset();
    let start = Instant::now();
    let result = self.run_body(build_dir, interrupt);
    self.duration = start.elapsed();

    if let Err(e) = &result {
      debug!(job = %self.name, error = %e, "job body failed");
      self.outcome = if e.is_interrupt() {
        Outcome::Aborted
      } else {
        Outcome::Failure
      };
      self.log.push(format!("{} {}: {}", self.name, self.outcome, e));
    }
    result
  }

  fn run_body(&mut self, build_dir: &Path, interrupt: &Interrupt) -> Result<(), JobError> {
    let inputs = self.resolved_inputs(build_dir);
    let outputs = self.resolved_outputs(build_dir);

    for output in &outputs {
      if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
      }
    }

    let mut scope = VerificationScope::open(self.name.clone(), inputs.iter().chain(&outputs).cloned());
    let mut guard = CompletionGuard::new(outputs.clone());

    let result = {
      let mut ctx = JobContext::new(&self.name, build_dir, &self.config, &inputs, &outputs, &mut scope, interrupt);
      panic::catch_unwind(AssertUnwindSafe(|| self.body.execute(&mut ctx)))
        .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload.as_ref()))))
    };

    match result {
      Ok(()) => {
        guard.complete();
        let report = scope.close();
        if report.is_clean() {
          self.outcome = Outcome::Success;
        } else {
          self.outcome = Outcome::Warning;
          self.log.extend(report.emit());
        }
        Ok(())
      }
      Err(e) => {
        drop(guard);
        Err(e)
      }
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}

impl fmt::Debug for Job {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Job")
      .field("name", &self.name)
      .field("alias", &self.alias)
      .field("position", &self.position)
      .field("inputs", &self.inputs)
      .field("outputs", &self.outputs)
      .field("config", &self.config)
      .field("properties", &self.properties)
      .field("outcome", &self.outcome)
      .finish_non_exhaustive()
  }
}
