mod list;
mod run;
mod show;
mod snapshots;

pub use list::cmd_list;
pub use run::{RunArgs, cmd_run};
pub use show::cmd_show;
pub use snapshots::cmd_snapshots;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use wikimap_lib::build::Build;
use wikimap_lib::consts::BUILDPATH_ENV;
use wikimap_lib::manifest::BuildManifest;
use wikimap_lib::settings::Settings;
use wikimap_lib::store::BuildDirectoryStore;

/// Which jobs of a manifest to plan.
#[derive(Args, Debug)]
pub struct PlanArgs {
  /// Build manifest declaring paths and jobs
  #[arg(short, long, default_value = "wikimap.json")]
  pub manifest: PathBuf,

  /// Jobs to build, e.g. "*", "3", "DL-TILES", "-2,5"
  #[arg(short, long, default_value = "*")]
  pub targets: String,

  /// Jobs to run even when up to date
  #[arg(short, long)]
  pub forced: Option<String>,

  /// Jobs never to run; their previous outputs are reused
  #[arg(short, long)]
  pub skipped: Option<String>,
}

/// Load the manifest and reduce it to the requested jobs.
pub fn planned_build(args: &PlanArgs) -> Result<Build> {
  let manifest = BuildManifest::load(&args.manifest)?;
  let mut build = manifest
    .into_registry()?
    .build()
    .with_context(|| format!("Invalid manifest {}", args.manifest.display()))?;

  let select = |expr: &Option<String>| -> Result<BTreeSet<usize>> {
    match expr {
      Some(expr) => build
        .select(expr)
        .with_context(|| format!("Invalid job selection '{}'", expr)),
      None => Ok(BTreeSet::new()),
    }
  };
  let targets = select(&Some(args.targets.clone()))?;
  let forced = select(&args.forced)?;
  let skipped = select(&args.skipped)?;

  build
    .plan_with(&targets, &forced, &skipped)
    .context("Failed to plan build")?;
  debug!(jobs = build.len(), "planned build");
  Ok(build)
}

pub fn require_store(settings: &Settings) -> Result<BuildDirectoryStore> {
  settings.store().with_context(|| {
    format!(
      "No archive root configured; pass --buildpath or set {}",
      BUILDPATH_ENV
    )
  })
}
