use super::{JobContext, JobError};

/// The work a job performs.
///
/// A body writes exactly the job's declared outputs under the context's build
/// directory, reading inputs and arguments through the context so that every
/// path it touches is recorded against the job's verification scope.
pub trait JobBody: Send + Sync {
  fn execute(&self, ctx: &mut JobContext<'_>) -> Result<(), JobError>;
}

impl<F> JobBody for F
where
  F: Fn(&mut JobContext<'_>) -> Result<(), JobError> + Send + Sync,
{
  fn execute(&self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
    self(ctx)
  }
}
