//! Implementation of the `wikimap run` command.
//!
//! Plans the manifest's jobs, applies `-c KEY=VALUE` overrides and runs the
//! build into a new snapshot. Ctrl-C stops the running command and leaves the
//! remaining jobs NOT_RUN.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};
use wikimap_lib::build::parse_assignment;
use wikimap_lib::interrupt::Interrupt;
use wikimap_lib::runner::{BuildRunner, Halt};
use wikimap_lib::settings::Settings;

use super::{PlanArgs, planned_build, require_store};
use crate::output::{describe_counts, print_error, print_success, print_summary, print_warning};

/// Exit code of a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Args, Debug)]
pub struct RunArgs {
  #[command(flatten)]
  pub plan: PlanArgs,

  /// Override a job argument, e.g. -c DL.url=https://... (value parsed as JSON when possible)
  #[arg(short, long = "config", value_name = "KEY=VALUE")]
  pub config: Vec<String>,

  /// Reuse artifacts of this snapshot instead of the latest one
  #[arg(long, value_name = "N")]
  pub base: Option<usize>,
}

pub fn cmd_run(settings: &Settings, args: RunArgs) -> Result<ExitCode> {
  let store = require_store(settings)?;
  let mut build = planned_build(&args.plan)?;

  let overrides = args
    .config
    .iter()
    .map(|assignment| parse_assignment(assignment))
    .collect::<Result<BTreeMap<_, _>, _>>()
    .context("Invalid configuration override")?;
  build
    .configure_flat(&overrides)
    .context("Invalid configuration override")?;

  let interrupt = Interrupt::new();
  let mut runner = BuildRunner::new(store).with_interrupt(interrupt.clone());
  if let Some(base) = args.base {
    runner = runner.with_base(base);
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(async move {
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          warn!("interrupt received, stopping the current job");
          interrupt.trigger();
        }
      });
      tokio::task::spawn_blocking(move || runner.run(&mut build)).await
    })
    .context("Build task panicked")?
    .context("Build failed")?;

  println!();
  print_summary(&report.summary.render());
  println!();
  info!(path = %report.build_dir.display(), "snapshot written");

  let counts = describe_counts(&report.summary);
  match &report.halt {
    None => {
      print_success(&format!("Build {} complete: {}", report.build_dir.display(), counts));
      Ok(ExitCode::SUCCESS)
    }
    Some(Halt::Failed { job, error }) => {
      print_error(&format!("{} failed: {}", job, error));
      print_error(&format!("Build {} incomplete: {}", report.build_dir.display(), counts));
      Ok(ExitCode::FAILURE)
    }
    Some(Halt::Interrupted { job }) => {
      print_warning(&format!("Interrupted at {}: {}", job, counts));
      Ok(ExitCode::from(EXIT_INTERRUPTED))
    }
  }
}
