//! Abstract, base-relative file references.
//!
//! Jobs never hold absolute paths. They declare [`AbstractPath`]s (or groups of
//! them) that only become concrete once a snapshot directory is chosen:
//!
//! ```text
//! AbstractPath("pagerank", "graph/pagerank.bin")
//!     .resolve("/archive/build7")  ->  /archive/build7/graph/pagerank.bin
//! ```
//!
//! Resolution is pure. Recording which paths a job body actually touched is the
//! job of [`crate::checker::VerificationScope`], which callers feed explicitly.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{BuildDirectoryStore, StoreError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
  #[error("path '{name}' ({path}) must be relative and stay inside the build directory")]
  NotContained { name: String, path: PathBuf },
}

/// A named file reference relative to a snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbstractPath {
  name: String,
  relative: PathBuf,
}

impl AbstractPath {
  pub fn new(name: impl Into<String>, relative: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      relative: relative.into(),
    }
  }

  /// Like [`new`](Self::new), but rejects paths that would resolve outside the base.
  pub fn try_new(name: impl Into<String>, relative: impl Into<PathBuf>) -> Result<Self, PathError> {
    let path = Self::new(name, relative);
    path.validate()?;
    Ok(path)
  }

  /// Absolute paths, `..` and empty paths all escape or replace the base on resolution.
  pub fn validate(&self) -> Result<(), PathError> {
    let mut named = false;
    let contained = self.relative.components().all(|component| match component {
      Component::Normal(_) => {
        named = true;
        true
      }
      Component::CurDir => true,
      _ => false,
    });
    if contained && named {
      Ok(())
    } else {
      Err(PathError::NotContained {
        name: self.name.clone(),
        path: self.relative.clone(),
      })
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn relative(&self) -> &Path {
    &self.relative
  }

  /// Join this path onto `base`.
  pub fn resolve(&self, base: &Path) -> PathBuf {
    base.join(&self.relative)
  }
}

impl fmt::Display for AbstractPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.name, self.relative.display())
  }
}

/// An ordered set of abstract paths.
///
/// Insertion order is preserved and duplicates (by relative path) are dropped,
/// so concatenating two groups behaves like an order-preserving union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathGroup {
  paths: Vec<AbstractPath>,
}

impl PathGroup {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(path: AbstractPath) -> Self {
    Self { paths: vec![path] }
  }

  pub fn push(&mut self, path: AbstractPath) {
    if !self.paths.iter().any(|p| p.relative == path.relative) {
      self.paths.push(path);
    }
  }

  /// Order-preserving union of `self` followed by `other`.
  pub fn concat(&self, other: &PathGroup) -> PathGroup {
    let mut merged = self.clone();
    merged.extend(other.paths.iter().cloned());
    merged
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &AbstractPath> {
    self.paths.iter()
  }

  pub fn get(&self, index: usize) -> Option<&AbstractPath> {
    self.paths.get(index)
  }

  pub fn validate(&self) -> Result<(), PathError> {
    self.paths.iter().try_for_each(AbstractPath::validate)
  }

  /// Relative paths in declaration order, used as graph keys by the planner.
  pub fn relative_paths(&self) -> impl Iterator<Item = &Path> {
    self.paths.iter().map(|p| p.relative())
  }

  /// Resolve every member against `base`, in order.
  pub fn resolve(&self, base: &Path) -> Vec<PathBuf> {
    self.paths.iter().map(|p| p.resolve(base)).collect()
  }

  /// Resolve against the latest snapshot of `store`.
  ///
  /// With no snapshot yet, the relative paths are returned unchanged.
  pub fn resolve_latest(&self, store: &BuildDirectoryStore) -> Result<Vec<PathBuf>, StoreError> {
    match store.last_build_dir()? {
      Some(dir) => Ok(self.resolve(&dir)),
      None => Ok(self.paths.iter().map(|p| p.relative.clone()).collect()),
    }
  }
}

impl FromIterator<AbstractPath> for PathGroup {
  fn from_iter<T: IntoIterator<Item = AbstractPath>>(iter: T) -> Self {
    let mut group = PathGroup::new();
    group.extend(iter);
    group
  }
}

impl Extend<AbstractPath> for PathGroup {
  fn extend<T: IntoIterator<Item = AbstractPath>>(&mut self, iter: T) {
    for path in iter {
      self.push(path);
    }
  }
}

impl From<AbstractPath> for PathGroup {
  fn from(path: AbstractPath) -> Self {
    PathGroup::single(path)
  }
}
