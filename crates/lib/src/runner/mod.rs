//! The orchestration loop.
//!
//! A run takes the archive lock, captures the latest (or chosen) snapshot as
//! the cache, creates a fresh snapshot directory and walks the planned jobs in
//! order. Each job either runs into the new directory or has its previous
//! outputs hard linked across. Whatever happens, the configuration record of
//! the completed jobs and the summary are written before the run returns. A
//! job skipped on request is recorded with the configuration its reused
//! artifacts were built with, or left out when that is unknown.

mod decision;
pub mod report;

pub use decision::{Decision, PreviousBuild, RunReason, SkipReason, decide};
pub use report::{JobSummary, RunSummary, format_duration};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::build::Build;
use crate::interrupt::Interrupt;
use crate::job::{BuildConfig, Job, JobError};
use crate::store::{BuildDirectoryStore, LinkMethod, StoreError, link_artifact};

/// Infrastructure failures. Job failures are reported through [`RunReport::halt`].
#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Why a run stopped before its last job.
#[derive(Debug)]
pub enum Halt {
  Failed { job: String, error: JobError },
  Interrupted { job: String },
}

impl Halt {
  pub fn job(&self) -> &str {
    match self {
      Halt::Failed { job, .. } | Halt::Interrupted { job } => job,
    }
  }
}

#[derive(Debug)]
pub struct RunReport {
  pub build_dir: PathBuf,
  pub summary: RunSummary,
  pub halt: Option<Halt>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.halt.is_none()
  }

  pub fn is_interrupted(&self) -> bool {
    matches!(self.halt, Some(Halt::Interrupted { .. }))
  }
}

/// Executes planned builds against a [`BuildDirectoryStore`].
#[derive(Debug, Clone)]
pub struct BuildRunner {
  store: BuildDirectoryStore,
  base: Option<usize>,
  interrupt: Interrupt,
}

impl BuildRunner {
  pub fn new(store: BuildDirectoryStore) -> Self {
    Self {
      store,
      base: None,
      interrupt: Interrupt::new(),
    }
  }

  /// Compare against snapshot `index` instead of the latest one.
  pub fn with_base(mut self, index: usize) -> Self {
    self.base = Some(index);
    self
  }

  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.interrupt = interrupt;
    self
  }

  pub fn store(&self) -> &BuildDirectoryStore {
    &self.store
  }

  pub fn interrupt(&self) -> &Interrupt {
    &self.interrupt
  }

  /// Run `build` into a new snapshot.
  pub fn run(&self, build: &mut Build) -> Result<RunReport, RunError> {
    let _lock = self.store.lock("run")?;

    let previous = self.previous_build()?;
    let new_dir = self.store.new_build_dir()?;
    info!("STARTING BUILD IN {}", new_dir.display());
    if let Some(previous) = &previous {
      info!(base = %previous.dir.display(), "reusing artifacts from previous build");
    }

    for job in build.jobs_mut() {
      job.reset();
    }

    let mut changed: HashSet<PathBuf> = HashSet::new();
    // Jobs reused on request; their artifacts still match the previous record.
    let mut held_back: HashSet<String> = HashSet::new();
    let mut halt = None;
    let mut failure = None;

    for job in build.jobs_mut() {
      if self.interrupt.is_triggered() {
        halt = Some(Halt::Interrupted {
          job: job.name().to_string(),
        });
        break;
      }

      match decide(job, previous.as_ref(), &new_dir, &changed) {
        Decision::Run(reason) => {
          info!(job = %job.name(), reason = %reason, "STARTING");
          changed.extend(job.resolved_outputs(&new_dir));
          if let Err(error) = job.run(&new_dir, &self.interrupt) {
            let name = job.name().to_string();
            halt = Some(if error.is_interrupt() {
              warn!(job = %name, "ABORTED");
              Halt::Interrupted { job: name }
            } else {
              warn!(job = %name, error = %error, "FAILURE");
              Halt::Failed { job: name, error }
            });
            break;
          }
        }
        Decision::Skip(reason) => {
          info!(job = %job.name(), reason = %reason, "SKIPPING");
          job.skip();
          if reason == SkipReason::Requested {
            held_back.insert(job.name().to_string());
          }
          if let Err(e) = publish_previous_outputs(job, previous.as_ref(), &new_dir) {
            failure = Some(e);
            break;
          }
        }
      }
    }

    let recorded: BuildConfig = build
      .iter()
      .filter(|job| job.outcome().is_completed())
      .filter_map(|job| {
        let config = if held_back.contains(job.name()) {
          previous.as_ref()?.config.get(job.name())?.clone()
        } else {
          job.config().clone()
        };
        Some((job.name().to_string(), config))
      })
      .collect();
    self.store.save_config(&new_dir, &recorded)?;

    let summary = RunSummary::from_build(build);
    let rendered = summary.render();
    info!("build summary:\n{}", rendered);
    self.store.save_summary(&new_dir, &rendered)?;

    if let Some(e) = failure {
      return Err(e.into());
    }

    Ok(RunReport {
      build_dir: new_dir,
      summary,
      halt,
    })
  }

  fn previous_build(&self) -> Result<Option<PreviousBuild>, StoreError> {
    let dir = match self.base {
      Some(index) => Some(self.store.existing_build_dir(index)?),
      None => self.store.last_build_dir()?,
    };
    let Some(dir) = dir else {
      return Ok(None);
    };
    let config = self.store.load_config(&dir)?;
    Ok(Some(PreviousBuild { dir, config }))
  }
}

/// Hard link a skipped job's outputs from the previous snapshot into `new_dir`.
///
/// Outputs absent from the previous snapshot can only occur for jobs carrying
/// the Skipped property; they are reported and left out.
fn publish_previous_outputs(job: &Job, previous: Option<&PreviousBuild>, new_dir: &Path) -> Result<(), StoreError> {
  for path in job.declared_outputs().iter() {
    let dst = path.resolve(new_dir);
    let src = match previous {
      Some(previous) => path.resolve(&previous.dir),
      None => {
        warn!(job = %job.name(), path = %path.relative().display(), "no previous build to reuse output from");
        continue;
      }
    };
    if !src.exists() {
      warn!(job = %job.name(), path = %src.display(), "output missing from previous build");
      continue;
    }
    if link_artifact(&src, &dst)? == LinkMethod::Copy {
      warn!(job = %job.name(), path = %dst.display(), "output copied instead of linked");
    }
  }
  Ok(())
}
