//! Ordered job collections: lookup, planning and configuration.

mod overrides;

pub use overrides::{Overrides, nest_overrides, parse_assignment};

use std::collections::{BTreeMap, BTreeSet, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::job::{BuildConfig, ConfigError, ConfigValue, Job};
use crate::path::PathError;
use crate::plan::{BuildPlanner, PlanError, parse_job_ranges};
use crate::runner::report::{Align, render_table};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("duplicate job name '{0}'")]
  DuplicateName(String),

  #[error("alias '{alias}' is used by both '{first}' and '{second}'")]
  DuplicateAlias {
    alias: String,
    first: String,
    second: String,
  },

  #[error("job '{job}' declares an invalid path: {source}")]
  InvalidPath {
    job: String,
    #[source]
    source: PathError,
  },

  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// An ordered sequence of jobs with contiguous positions `0..n`.
#[derive(Debug, Clone)]
pub struct Build {
  jobs: Vec<Job>,
}

impl Build {
  /// Assemble a build, numbering jobs in order.
  ///
  /// Names must be unique, and so must aliases where present. Every declared
  /// path must stay inside the build directory.
  pub fn new(jobs: Vec<Job>) -> Result<Self, BuildError> {
    let mut names = HashSet::new();
    let mut aliases: BTreeMap<&str, &str> = BTreeMap::new();
    for job in &jobs {
      if !names.insert(job.name()) {
        return Err(BuildError::DuplicateName(job.name().to_string()));
      }
      job
        .declared_inputs()
        .validate()
        .and_then(|()| job.declared_outputs().validate())
        .map_err(|source| BuildError::InvalidPath {
          job: job.name().to_string(),
          source,
        })?;
      if let Some(alias) = job.alias_name()
        && let Some(first) = aliases.insert(alias, job.name())
      {
        return Err(BuildError::DuplicateAlias {
          alias: alias.to_string(),
          first: first.to_string(),
          second: job.name().to_string(),
        });
      }
    }

    let mut build = Self { jobs };
    build.renumber();
    Ok(build)
  }

  fn renumber(&mut self) {
    for (position, job) in self.jobs.iter_mut().enumerate() {
      job.set_position(position);
    }
  }

  pub fn len(&self) -> usize {
    self.jobs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.jobs.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Job> {
    self.jobs.iter()
  }

  pub fn jobs(&self) -> &[Job] {
    &self.jobs
  }

  pub fn jobs_mut(&mut self) -> &mut [Job] {
    &mut self.jobs
  }

  pub fn get(&self, position: usize) -> Option<&Job> {
    self.jobs.get(position)
  }

  pub fn by_name(&self, name: &str) -> Option<&Job> {
    self.jobs.iter().find(|job| job.name() == name)
  }

  pub fn by_alias(&self, alias: &str) -> Option<&Job> {
    self.jobs.iter().find(|job| job.alias_name() == Some(alias))
  }

  /// Look a job up by position, then name, then alias.
  pub fn find(&self, key: &str) -> Option<&Job> {
    match key.parse::<usize>() {
      Ok(position) => self.get(position),
      Err(_) => self.by_name(key).or_else(|| self.by_alias(key)),
    }
  }

  /// Resolve a range expression (`"*"`, `"3-7"`, `"PR,W2V-"`, ...) to positions.
  pub fn select(&self, expr: &str) -> Result<BTreeSet<usize>, PlanError> {
    parse_job_ranges(expr, self.len(), |token| {
      self.by_name(token).or_else(|| self.by_alias(token)).map(Job::position)
    })
  }

  /// Reduce the build to what `targets` and `forced` need.
  pub fn plan(&mut self, targets: &BTreeSet<usize>, forced: &BTreeSet<usize>) -> Result<(), BuildError> {
    self.plan_with(targets, forced, &BTreeSet::new())
  }

  /// Reduce the build to the dependency closure of `targets ∪ forced`.
  ///
  /// Forced jobs are marked Forced and skipped jobs Skipped. The closure keeps
  /// the original relative order and positions are renumbered from zero.
  pub fn plan_with(
    &mut self,
    targets: &BTreeSet<usize>,
    forced: &BTreeSet<usize>,
    skipped: &BTreeSet<usize>,
  ) -> Result<(), BuildError> {
    let len = self.len();
    if let Some(&position) = targets.iter().chain(forced).chain(skipped).find(|&&p| p >= len) {
      return Err(PlanError::PositionOutOfRange { position, len }.into());
    }
    if let Some(&position) = forced.intersection(skipped).next() {
      return Err(PlanError::ForcedAndSkipped(self.jobs[position].name().to_string()).into());
    }

    let planner = BuildPlanner::new(&self.jobs)?;
    let requested: BTreeSet<usize> = targets.union(forced).copied().collect();
    let closure = planner.closure(&requested);

    for (position, job) in self.jobs.iter_mut().enumerate() {
      let properties = job.properties_mut();
      properties.forced = forced.contains(&position);
      properties.skipped = skipped.contains(&position);
    }

    let jobs = std::mem::take(&mut self.jobs);
    self.jobs = jobs
      .into_iter()
      .enumerate()
      .filter(|(position, _)| closure.contains(position))
      .map(|(_, job)| job)
      .collect();
    self.renumber();

    debug!(
      requested = requested.len(),
      planned = self.jobs.len(),
      "planned build"
    );
    Ok(())
  }

  /// Apply `{job_name: {arg: value}}` overrides.
  ///
  /// All overrides are validated first; on error nothing is changed.
  pub fn configure(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
    let mut validated = Vec::with_capacity(overrides.len());
    for (job_name, args) in overrides {
      let position = self
        .by_name(job_name)
        .map(Job::position)
        .ok_or_else(|| ConfigError::UnknownJob(job_name.clone()))?;
      validated.push((position, self.jobs[position].validate_overrides(args)?));
    }
    for (position, values) in validated {
      self.jobs[position].apply_validated(values);
    }
    Ok(())
  }

  /// Apply `{"alias.arg": value}` overrides.
  pub fn configure_flat(&mut self, flat: &BTreeMap<String, ConfigValue>) -> Result<(), ConfigError> {
    let nested = nest_overrides(self, flat)?;
    self.configure(&nested)
  }

  /// Effective configuration of every job.
  pub fn full_config(&self) -> BuildConfig {
    self
      .jobs
      .iter()
      .map(|job| (job.name().to_string(), job.config().clone()))
      .collect()
  }

  /// Explicitly overridden arguments only, for jobs that have any.
  pub fn custom_config(&self) -> BuildConfig {
    self
      .jobs
      .iter()
      .map(|job| (job.name().to_string(), job.custom_config()))
      .filter(|(_, config)| !config.is_empty())
      .collect()
  }

  /// `#`, `ALIAS`, `JOB NAME` listing.
  pub fn job_table(&self) -> String {
    let rows: Vec<Vec<String>> = self
      .jobs
      .iter()
      .map(|job| {
        vec![
          job.position().to_string(),
          job.alias_name().unwrap_or_default().to_string(),
          job.name().to_string(),
        ]
      })
      .collect();
    render_table(&["#", "ALIAS", "JOB NAME"], &rows, &[Align::Right, Align::Left, Align::Left])
  }
}
