//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, outcome coloring for run summaries and JSON output.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use wikimap_lib::job::Outcome;
use wikimap_lib::runner::RunSummary;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

/// Short tally of a run, e.g. `2 run, 1 skipped, 1 not run`.
pub fn describe_counts(summary: &RunSummary) -> String {
  let ran = summary.count(Outcome::Success) + summary.count(Outcome::Warning);
  let mut parts = vec![format!("{} run", ran)];
  for (outcome, label) in [
    (Outcome::Skipped, "skipped"),
    (Outcome::Warning, "with warnings"),
    (Outcome::Failure, "failed"),
    (Outcome::Aborted, "aborted"),
    (Outcome::NotRun, "not run"),
  ] {
    let count = summary.count(outcome);
    if count > 0 {
      parts.push(format!("{} {}", count, label));
    }
  }
  parts.join(", ")
}

/// Print a rendered summary table, coloring each job row by its outcome.
pub fn print_summary(rendered: &str) {
  for line in rendered.lines() {
    let outcome = [
      Outcome::Success,
      Outcome::Skipped,
      Outcome::Warning,
      Outcome::Failure,
      Outcome::Aborted,
      Outcome::NotRun,
    ]
    .into_iter()
    .find(|outcome| line.contains(&format!("[{}]", outcome)));

    match outcome {
      Some(Outcome::Success) => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.green())),
      Some(Outcome::Skipped) => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.dimmed())),
      Some(Outcome::Warning) => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.yellow())),
      Some(Outcome::Failure | Outcome::Aborted) => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.red())),
      _ => println!("{}", line),
    }
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
