//! Plain-text tables for job listings and run summaries.

use std::fmt::Write as _;
use std::time::Duration;

use crate::build::Build;
use crate::job::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
  Left,
  Right,
  Center,
}

/// Render `rows` under `headers`, padding every column to its widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], aligns: &[Align]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (i, cell) in row.iter().enumerate() {
      if let Some(width) = widths.get_mut(i) {
        *width = (*width).max(cell.chars().count());
      }
    }
  }

  let mut out = String::new();
  let _ = writeln!(out, "{}", render_row(headers, &widths, aligns));
  let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
  let _ = writeln!(out, "{}", rule.join("  "));
  for row in rows {
    let cells: Vec<&str> = row.iter().map(String::as_str).collect();
    let _ = writeln!(out, "{}", render_row(&cells, &widths, aligns));
  }
  out
}

fn render_row(cells: &[&str], widths: &[usize], aligns: &[Align]) -> String {
  let padded: Vec<String> = cells
    .iter()
    .zip(widths)
    .enumerate()
    .map(|(i, (cell, &width))| pad(cell, width, aligns.get(i).copied().unwrap_or(Align::Left)))
    .collect();
  padded.join("  ").trim_end().to_string()
}

fn pad(cell: &str, width: usize, align: Align) -> String {
  match align {
    Align::Left => format!("{cell:<width$}"),
    Align::Right => format!("{cell:>width$}"),
    Align::Center => format!("{cell:^width$}"),
  }
}

/// `HH:MM:SS.mmm`
pub fn format_duration(duration: Duration) -> String {
  let millis = duration.as_millis();
  let hours = millis / 3_600_000;
  let minutes = (millis / 60_000) % 60;
  let seconds = (millis / 1_000) % 60;
  format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis % 1_000)
}

/// Outcome of one job in a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
  pub position: usize,
  pub name: String,
  pub outcome: Outcome,
  pub duration: Duration,
  pub log: Vec<String>,
}

/// Outcomes of every job of a run, in planned order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
  pub jobs: Vec<JobSummary>,
}

impl RunSummary {
  pub fn from_build(build: &Build) -> Self {
    let jobs = build
      .iter()
      .map(|job| JobSummary {
        position: job.position(),
        name: job.name().to_string(),
        outcome: job.outcome(),
        duration: job.duration(),
        log: job.log().to_vec(),
      })
      .collect();
    Self { jobs }
  }

  pub fn count(&self, outcome: Outcome) -> usize {
    self.jobs.iter().filter(|job| job.outcome == outcome).count()
  }

  pub fn outcome_of(&self, name: &str) -> Option<Outcome> {
    self.jobs.iter().find(|job| job.name == name).map(|job| job.outcome)
  }

  /// Diagnostic lines of every job, in job order.
  pub fn log_lines(&self) -> impl Iterator<Item = &str> {
    self.jobs.iter().flat_map(|job| job.log.iter().map(String::as_str))
  }

  /// `#`, `JOB NAME`, `OUTCOME`, `DURATION` table followed by any log lines.
  pub fn render(&self) -> String {
    let rows: Vec<Vec<String>> = self
      .jobs
      .iter()
      .map(|job| {
        vec![
          job.position.to_string(),
          job.name.clone(),
          format!("[{}]", job.outcome),
          format_duration(job.duration),
        ]
      })
      .collect();
    let mut out = render_table(
      &["#", "JOB NAME", "OUTCOME", "DURATION"],
      &rows,
      &[Align::Right, Align::Left, Align::Center, Align::Center],
    );
    let lines: Vec<&str> = self.log_lines().collect();
    if !lines.is_empty() {
      out.push('\n');
      for line in lines {
        out.push_str(line);
        out.push('\n');
      }
    }
    out
  }
}
