//! Where snapshots live, from the environment.

use std::path::PathBuf;

use crate::consts::{BUILD_PREFIX_ENV, BUILDPATH_ENV, DEFAULT_BUILD_PREFIX};
use crate::store::BuildDirectoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Archive root. `None` when neither the environment nor a flag names one.
  pub build_path: Option<PathBuf>,
  pub build_prefix: String,
}

impl Settings {
  pub fn from_env() -> Self {
    Self {
      build_path: std::env::var_os(BUILDPATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from),
      build_prefix: std::env::var(BUILD_PREFIX_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_BUILD_PREFIX.to_string()),
    }
  }

  /// Apply explicit values over the environment.
  pub fn with_overrides(mut self, build_path: Option<PathBuf>, build_prefix: Option<String>) -> Self {
    if let Some(path) = build_path {
      self.build_path = Some(path);
    }
    if let Some(prefix) = build_prefix {
      self.build_prefix = prefix;
    }
    self
  }

  pub fn store(&self) -> Option<BuildDirectoryStore> {
    self
      .build_path
      .clone()
      .map(|root| BuildDirectoryStore::new(root, self.build_prefix.clone()))
  }
}
