use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use wikimap_lib::settings::Settings;

use super::require_store;
use crate::output::{OutputFormat, print_json, print_stat};

/// Print the configuration record of snapshot `index`, and its summary in text mode.
pub fn cmd_show(settings: &Settings, index: usize, output: OutputFormat) -> Result<()> {
  let store = require_store(settings)?;
  let dir = store.existing_build_dir(index)?;
  let config = store.load_config(&dir)?;

  if output.is_json() {
    return print_json(&config);
  }

  println!(
    "{}",
    format!("Snapshot {}", index).if_supports_color(Stream::Stdout, |s| s.bold())
  );
  print_stat("Path", &dir.display().to_string());
  print_stat("Jobs", &config.len().to_string());

  for (job, args) in config.iter() {
    println!();
    println!("{}", job.if_supports_color(Stream::Stdout, |s| s.cyan()));
    for (arg, value) in args.iter() {
      println!("  {} = {}", arg, value);
    }
  }

  if let Some(summary) = store.load_summary(&dir)? {
    println!();
    println!("{}", summary.trim_end());
  }
  Ok(())
}
