//! Statically declared, ordered job constructors.

use std::fmt;

use crate::build::{Build, BuildError};
use crate::job::Job;

type Constructor = Box<dyn Fn() -> Job + Send + Sync>;

/// Every job a pipeline knows about, in authoring order.
///
/// Producers must be registered before their consumers. A fresh [`Build`] is
/// created from the registry for every invocation.
#[derive(Default)]
pub struct JobRegistry {
  constructors: Vec<Constructor>,
}

impl JobRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<F>(&mut self, constructor: F) -> &mut Self
  where
    F: Fn() -> Job + Send + Sync + 'static,
  {
    self.constructors.push(Box::new(constructor));
    self
  }

  /// Register a ready-made job; every build gets its own clone.
  pub fn register_job(&mut self, job: Job) -> &mut Self {
    self.register(move || job.clone())
  }

  pub fn len(&self) -> usize {
    self.constructors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.constructors.is_empty()
  }

  pub fn build(&self) -> Result<Build, BuildError> {
    Build::new(self.constructors.iter().map(|construct| construct()).collect())
  }
}

impl fmt::Debug for JobRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JobRegistry")
      .field("jobs", &self.constructors.len())
      .finish()
  }
}
