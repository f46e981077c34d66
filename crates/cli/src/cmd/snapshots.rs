use anyhow::Result;
use serde::Serialize;
use wikimap_lib::settings::Settings;

use super::require_store;
use crate::output::{OutputFormat, print_info, print_json, symbols};

#[derive(Debug, Serialize)]
struct SnapshotListItem {
  index: usize,
  path: String,
  jobs: usize,
  is_latest: bool,
}

/// List the snapshot directories of the archive, oldest first.
pub fn cmd_snapshots(settings: &Settings, output: OutputFormat) -> Result<()> {
  let store = require_store(settings)?;
  let entries = store.list()?;
  let latest = entries.last().map(|entry| entry.index);

  let items = entries
    .iter()
    .map(|entry| {
      Ok(SnapshotListItem {
        index: entry.index,
        path: entry.path.display().to_string(),
        jobs: store.load_config(&entry.path)?.len(),
        is_latest: Some(entry.index) == latest,
      })
    })
    .collect::<Result<Vec<_>>>()?;

  if output.is_json() {
    return print_json(&items);
  }

  if items.is_empty() {
    print_info(&format!("No snapshots in {}", store.root().display()));
    return Ok(());
  }

  for item in &items {
    let marker = if item.is_latest { symbols::ARROW } else { " " };
    println!("{} {:>4}  {}  ({} jobs)", marker, item.index, item.path, item.jobs);
  }
  Ok(())
}
