//! JSON build manifests.
//!
//! A manifest declares the named paths of a pipeline and its jobs in
//! authoring order, producers before consumers:
//!
//! ```json
//! {
//!   "paths": {
//!     "dump": "raw/dump.xml",
//!     "tiles": ["tiles/index.json", "tiles/data"]
//!   },
//!   "jobs": [
//!     {
//!       "name": "DOWNLOAD",
//!       "alias": "DL",
//!       "outputs": ["dump"],
//!       "args": { "url": "https://dumps.example.org/latest.xml" },
//!       "command": "curl -sSfo {out:0} {config:url}"
//!     },
//!     {
//!       "name": "TILES",
//!       "inputs": ["dump"],
//!       "outputs": ["tiles"],
//!       "args": { "zoom": { "default": 8, "min": 1, "max": 18 } },
//!       "command": ["make-tiles", "--zoom={config:zoom}", "{in:0}", "{outputs}"]
//!     }
//!   ]
//! }
//! ```
//!
//! A string command runs through the platform shell; an array is an argv.

mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::body::CommandBody;
use crate::job::{ArgSpec, Job};
use crate::path::{AbstractPath, PathError, PathGroup};
use crate::registry::JobRegistry;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse manifest: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("job '{job}' refers to undeclared path '{name}'")]
  UnknownPath { job: String, name: String },

  #[error("job '{0}' has an empty command")]
  EmptyCommand(String),

  #[error("invalid manifest path: {0}")]
  InvalidPath(#[from] PathError),
}

impl BuildManifest {
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let manifest = Self::parse(&content)?;
    debug!(path = %path.display(), jobs = manifest.jobs.len(), "loaded manifest");
    Ok(manifest)
  }

  pub fn parse(content: &str) -> Result<Self, ManifestError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Declared path names resolved into groups.
  ///
  /// Fails on any path that is absolute or climbs out with `..`.
  pub fn path_groups(&self) -> Result<BTreeMap<&str, PathGroup>, ManifestError> {
    let mut groups = BTreeMap::new();
    for (name, decl) in &self.paths {
      let group = decl
        .relative_paths()
        .into_iter()
        .map(|relative| AbstractPath::try_new(name.clone(), relative))
        .collect::<Result<PathGroup, _>>()?;
      groups.insert(name.as_str(), group);
    }
    Ok(groups)
  }

  /// Convert every job declaration into a registered constructor.
  pub fn into_registry(&self) -> Result<JobRegistry, ManifestError> {
    let groups = self.path_groups()?;
    let mut registry = JobRegistry::new();
    for decl in &self.jobs {
      let job = Self::job_from_decl(decl, &groups)?;
      registry.register_job(job);
    }
    Ok(registry)
  }

  fn job_from_decl(decl: &JobDecl, groups: &BTreeMap<&str, PathGroup>) -> Result<Job, ManifestError> {
    let lookup = |name: &String| {
      groups.get(name.as_str()).ok_or_else(|| ManifestError::UnknownPath {
        job: decl.name.clone(),
        name: name.clone(),
      })
    };

    let body = match &decl.command {
      CommandDecl::Shell(script) => CommandBody::shell(script.clone()),
      CommandDecl::Argv(argv) => {
        let (program, args) = argv
          .split_first()
          .ok_or_else(|| ManifestError::EmptyCommand(decl.name.clone()))?;
        CommandBody::new(program.clone()).args(args.iter().cloned())
      }
    };
    let body = decl
      .env
      .iter()
      .fold(body, |body, (key, value)| body.env(key.clone(), value.clone()));

    let mut job = Job::with_body(decl.name.clone(), Arc::new(body));
    if let Some(alias) = &decl.alias {
      job = job.alias(alias.clone());
    }
    for name in &decl.inputs {
      job = job.inputs(lookup(name)?);
    }
    for name in &decl.outputs {
      job = job.outputs(lookup(name)?);
    }
    for (name, arg) in &decl.args {
      let spec = match arg {
        ArgDecl::Spec(spec) => ArgSpec::new(name.clone(), spec.default.clone()).with_range(spec.min, spec.max),
        ArgDecl::Value(default) => ArgSpec::new(name.clone(), default.clone()),
      };
      job = job.arg_spec(spec);
    }
    Ok(job)
  }
}
