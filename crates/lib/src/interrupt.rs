//! Cooperative cancellation of a running build.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::job::JobError;

/// A cloneable flag shared between whoever receives the interrupt (the CLI's
/// Ctrl-C handler) and the job bodies that poll it.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
  flag: Arc<AtomicBool>,
}

impl Interrupt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn trigger(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_triggered(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  /// `Err(JobError::Interrupted)` once the flag has been raised.
  pub fn check(&self) -> Result<(), JobError> {
    if self.is_triggered() {
      Err(JobError::Interrupted)
    } else {
      Ok(())
    }
  }
}
