//! Job bodies that run an external program.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::job::{JobBody, JobContext, JobError};

use super::placeholder::{self, Placeholder, Segment};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `program args...` after expanding placeholders in every argument.
///
/// The child inherits stdout and stderr. It is polled until it exits and is
/// killed as soon as the run is interrupted.
#[derive(Debug, Clone)]
pub struct CommandBody {
  program: String,
  args: Vec<String>,
  env: BTreeMap<String, String>,
  cwd: Option<PathBuf>,
}

impl CommandBody {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: BTreeMap::new(),
      cwd: None,
    }
  }

  /// Run `script` through the platform shell.
  pub fn shell(script: impl Into<String>) -> Self {
    let (shell, flag) = shell();
    Self::new(shell).arg(flag).arg(script)
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  /// Working directory of the child. Defaults to the build directory.
  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  /// Expand every argument against `ctx`, recording the paths used.
  pub fn expand_args(&self, ctx: &mut JobContext<'_>) -> Result<Vec<String>, JobError> {
    let mut expanded = Vec::with_capacity(self.args.len());
    for arg in &self.args {
      let segments = placeholder::parse(arg).map_err(|e| JobError::Placeholder {
        placeholder: arg.clone(),
        reason: e.to_string(),
      })?;

      // A lone group placeholder becomes one argument per path.
      if let [Segment::Placeholder(group @ (Placeholder::Inputs | Placeholder::Outputs))] = segments.as_slice() {
        expanded.extend(expand_group(group, ctx).into_iter().map(|p| p.display().to_string()));
        continue;
      }

      let mut value = String::new();
      for segment in &segments {
        match segment {
          Segment::Literal(text) => value.push_str(text),
          Segment::Placeholder(p) => value.push_str(&expand(p, ctx)?),
        }
      }
      expanded.push(value);
    }
    Ok(expanded)
  }
}

fn expand_group(group: &Placeholder, ctx: &mut JobContext<'_>) -> Vec<PathBuf> {
  match group {
    Placeholder::Inputs => ctx.inputs(),
    _ => ctx.outputs(),
  }
}

fn expand(placeholder: &Placeholder, ctx: &mut JobContext<'_>) -> Result<String, JobError> {
  let out_of_range = |kind: &str, index: usize| JobError::Placeholder {
    placeholder: format!("{{{kind}:{index}}}"),
    reason: "no such declared path".to_string(),
  };

  let value = match placeholder {
    Placeholder::Input(index) => ctx
      .input(*index)
      .ok_or_else(|| out_of_range("in", *index))?
      .display()
      .to_string(),
    Placeholder::Output(index) => ctx
      .output(*index)
      .ok_or_else(|| out_of_range("out", *index))?
      .display()
      .to_string(),
    Placeholder::Inputs | Placeholder::Outputs => expand_group(placeholder, ctx)
      .iter()
      .map(|p| p.display().to_string())
      .collect::<Vec<_>>()
      .join(" "),
    Placeholder::Config(key) => ctx
      .arg(key)
      .ok_or_else(|| JobError::Placeholder {
        placeholder: format!("{{config:{key}}}"),
        reason: "no such argument".to_string(),
      })?
      .to_string(),
    Placeholder::BuildDir => ctx.build_dir().display().to_string(),
  };
  Ok(value)
}

impl JobBody for CommandBody {
  fn execute(&self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
    let args = self.expand_args(ctx)?;
    let cwd = self.cwd.clone().unwrap_or_else(|| ctx.build_dir().to_path_buf());

    info!(job = %ctx.job_name(), program = %self.program, "running command");
    debug!(args = ?args, cwd = %cwd.display(), "spawning process");

    let mut child = Command::new(&self.program)
      .args(&args)
      .envs(&self.env)
      .current_dir(&cwd)
      .stdin(Stdio::null())
      .spawn()
      .map_err(|source| JobError::Spawn {
        program: self.program.clone(),
        source,
      })?;

    let status = loop {
      if let Some(status) = child.try_wait()? {
        break status;
      }
      if ctx.interrupt().is_triggered() {
        warn!(job = %ctx.job_name(), pid = child.id(), "interrupted, killing command");
        if let Err(e) = child.kill() {
          warn!(error = %e, "failed to kill command");
        }
        let _ = child.wait();
        return Err(JobError::Interrupted);
      }
      thread::sleep(POLL_INTERVAL);
    };

    // A terminal Ctrl-C reaches the child too, often before the flag is raised.
    if ctx.interrupt().is_triggered() || killed_by_interrupt(&status) {
      warn!(job = %ctx.job_name(), "command interrupted");
      return Err(JobError::Interrupted);
    }
    check_status(&self.program, status)
  }
}

#[cfg(unix)]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
  use std::os::unix::process::ExitStatusExt;

  const SIGINT: i32 = 2;
  status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(_status: &ExitStatus) -> bool {
  false
}

fn check_status(program: &str, status: ExitStatus) -> Result<(), JobError> {
  if status.success() {
    Ok(())
  } else {
    Err(JobError::CommandFailed {
      program: program.to_string(),
      code: status.code(),
    })
  }
}

#[cfg(unix)]
fn shell() -> (&'static str, &'static str) {
  ("/bin/sh", "-c")
}

#[cfg(windows)]
fn shell() -> (&'static str, &'static str) {
  ("cmd.exe", "/C")
}
