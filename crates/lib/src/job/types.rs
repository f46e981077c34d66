//! Outcome, property and error types shared by jobs and the runner.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of the most recent run of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
  Success,
  Failure,
  Skipped,
  Aborted,
  /// The body finished but its declared dependencies did not match what it touched.
  Warning,
  #[default]
  NotRun,
}

impl Outcome {
  pub fn as_str(self) -> &'static str {
    match self {
      Outcome::Success => "SUCCESS",
      Outcome::Failure => "FAILURE",
      Outcome::Skipped => "SKIPPED",
      Outcome::Aborted => "ABORTED",
      Outcome::Warning => "WARNING",
      Outcome::NotRun => "NOT_RUN",
    }
  }

  /// Whether the job's outputs are valid in the snapshot it ran against.
  pub fn is_completed(self) -> bool {
    matches!(self, Outcome::Success | Outcome::Warning | Outcome::Skipped)
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Planning properties attached to a job for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProperties {
  /// Run even if the previous snapshot could be reused.
  pub forced: bool,
  /// Never run; reuse whatever the previous snapshot holds.
  pub skipped: bool,
}

/// Errors raised by job bodies.
#[derive(Debug, Error)]
pub enum JobError {
  /// The run was interrupted while the body was executing.
  #[error("interrupted")]
  Interrupted,

  /// An external program exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {program}")]
  CommandFailed { program: String, code: Option<i32> },

  /// An external program could not be started.
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// A placeholder in a command could not be expanded.
  #[error("invalid placeholder {placeholder}: {reason}")]
  Placeholder { placeholder: String, reason: String },

  /// The body panicked; the payload message is kept.
  #[error("job body panicked: {0}")]
  Panicked(String),

  #[error("io error: {0}")]
  Io(#[from] io::Error),

  /// Free-form failure raised by a job body.
  #[error("{0}")]
  Message(String),
}

impl JobError {
  pub fn msg(message: impl fmt::Display) -> Self {
    JobError::Message(message.to_string())
  }

  pub fn is_interrupt(&self) -> bool {
    matches!(self, JobError::Interrupted)
  }
}
