//! Implementation of the `wikimap list` command.

use anyhow::Result;
use wikimap_lib::job::Job;

use super::{PlanArgs, planned_build};
use crate::output::print_info;

/// Print the job table of the planned build.
pub fn cmd_list(args: &PlanArgs) -> Result<()> {
  let build = planned_build(args)?;

  println!("{}", build.job_table());

  let flagged = |pick: fn(&Job) -> bool| -> Vec<&str> { build.iter().filter(|job| pick(job)).map(Job::name).collect() };
  let forced = flagged(|job| job.properties().forced);
  let skipped = flagged(|job| job.properties().skipped);
  if !forced.is_empty() {
    print_info(&format!("Forced: {}", forced.join(", ")));
  }
  if !skipped.is_empty() {
    print_info(&format!("Skipped: {}", skipped.join(", ")));
  }

  Ok(())
}
