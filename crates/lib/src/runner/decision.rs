//! Run-or-reuse decision for a single job.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::job::{BuildConfig, Job};

/// Why a job has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReason {
  Forced,
  /// An input was produced earlier in this same run.
  InputChanged(PathBuf),
  ConfigChanged,
  OutputMissing(PathBuf),
  NoPreviousBuild,
}

impl fmt::Display for RunReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunReason::Forced => f.write_str("forced"),
      RunReason::InputChanged(path) => write!(f, "input changed: {}", path.display()),
      RunReason::ConfigChanged => f.write_str("config changed"),
      RunReason::OutputMissing(path) => write!(f, "output missing: {}", path.display()),
      RunReason::NoPreviousBuild => f.write_str("no previous build"),
    }
  }
}

/// Why a job is reused instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  UpToDate,
  /// The job carries the Skipped property.
  Requested,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::UpToDate => f.write_str("up to date"),
      SkipReason::Requested => f.write_str("skip requested"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Run(RunReason),
  Skip(SkipReason),
}

/// The prior snapshot a run compares against, captured once at run start.
#[derive(Debug, Clone)]
pub struct PreviousBuild {
  pub dir: PathBuf,
  pub config: BuildConfig,
}

/// Decide whether `job` must run in `new_dir`.
///
/// A job runs when it is forced, when one of its inputs was produced earlier
/// in this run, when its configuration differs from the recorded one, or when
/// one of its outputs is absent from the previous snapshot.
pub fn decide(job: &Job, previous: Option<&PreviousBuild>, new_dir: &Path, changed: &HashSet<PathBuf>) -> Decision {
  let properties = job.properties();
  if properties.skipped {
    return Decision::Skip(SkipReason::Requested);
  }
  if properties.forced {
    return Decision::Run(RunReason::Forced);
  }

  if let Some(input) = job.resolved_inputs(new_dir).into_iter().find(|input| changed.contains(input)) {
    return Decision::Run(RunReason::InputChanged(input));
  }

  let Some(previous) = previous else {
    return Decision::Run(RunReason::NoPreviousBuild);
  };

  let recorded = previous.config.get(job.name()).cloned().unwrap_or_default();
  if &recorded != job.config() {
    return Decision::Run(RunReason::ConfigChanged);
  }

  if let Some(missing) = job.resolved_outputs(&previous.dir).into_iter().find(|output| !output.exists()) {
    return Decision::Run(RunReason::OutputMissing(missing));
  }

  Decision::Skip(SkipReason::UpToDate)
}
