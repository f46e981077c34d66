//! All-or-nothing publication of a job's declared outputs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Deletes every declared output on drop unless [`complete`](Self::complete) was called.
///
/// Held across a job body. A body that fails or unwinds must not leave a
/// half-written artifact that a later run would mistake for a cached output.
#[derive(Debug)]
pub struct CompletionGuard {
  outputs: Vec<PathBuf>,
  completed: bool,
}

impl CompletionGuard {
  pub fn new(outputs: Vec<PathBuf>) -> Self {
    Self {
      outputs,
      completed: false,
    }
  }

  /// Mark the outputs as complete; dropping the guard becomes a no-op.
  pub fn complete(&mut self) {
    self.completed = true;
  }

  pub fn is_complete(&self) -> bool {
    self.completed
  }
}

impl Drop for CompletionGuard {
  fn drop(&mut self) {
    if self.completed {
      return;
    }
    for output in &self.outputs {
      match remove_output(output) {
        Ok(true) => debug!(path = %output.display(), "removed incomplete output"),
        Ok(false) => {}
        Err(e) => warn!(path = %output.display(), error = %e, "failed to remove incomplete output"),
      }
    }
  }
}

/// Remove a file, symlink or directory tree. Returns whether anything existed.
fn remove_output(path: &Path) -> io::Result<bool> {
  let metadata = match fs::symlink_metadata(path) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
    Err(e) => return Err(e),
  };
  if metadata.is_dir() {
    fs::remove_dir_all(path)?;
  } else {
    fs::remove_file(path)?;
  }
  Ok(true)
}
