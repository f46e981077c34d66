//! Numbered snapshot directories.
//!
//! # Layout
//!
//! ```text
//! <archive>/
//! ├── .lock              # held by the runner writing a snapshot
//! ├── build0/
//! │   ├── config         # BuildConfig record, JSON literals only
//! │   ├── summary        # outcome table of the run
//! │   └── ...            # artifacts at their declared relative paths
//! ├── build1/
//! └── ...
//! ```
//!
//! Snapshots are append-only: indices grow strictly and a directory is never
//! written again once the run that created it has finished.

mod link;
mod lock;

pub use link::{LinkMethod, link_artifact};
pub use lock::{LockHolder, StoreLock, StoreLockError};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILENAME, SUMMARY_FILENAME};
use crate::job::BuildConfig;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read directory {path}: {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read config record {path}: {source}")]
  ReadConfig {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config record {path}: {source}")]
  ParseConfig {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write {path}: {source}")]
  WriteConfig {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("snapshot {0} does not exist")]
  SnapshotNotFound(usize),

  #[error("failed to link {src} to {dst}: {source}")]
  Link {
    src: PathBuf,
    dst: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Lock(#[from] StoreLockError),
}

/// One snapshot directory found in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
  pub index: usize,
  pub path: PathBuf,
}

/// An archive root holding `prefix0`, `prefix1`, ... snapshot directories.
#[derive(Debug, Clone)]
pub struct BuildDirectoryStore {
  root: PathBuf,
  prefix: String,
}

impl BuildDirectoryStore {
  pub fn new(root: PathBuf, prefix: impl Into<String>) -> Self {
    Self {
      root,
      prefix: prefix.into(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// Path of snapshot `index`, whether or not it exists.
  pub fn build_dir(&self, index: usize) -> PathBuf {
    self.root.join(format!("{}{}", self.prefix, index))
  }

  /// Index encoded in a directory name, if it is `prefix` followed by a canonical integer.
  fn parse_index(&self, name: &str) -> Option<usize> {
    let suffix = name.strip_prefix(&self.prefix)?;
    let index: usize = suffix.parse().ok()?;
    (index.to_string() == suffix).then_some(index)
  }

  /// All snapshots, ordered by index. A missing archive root has none.
  pub fn list(&self) -> Result<Vec<SnapshotEntry>, StoreError> {
    let entries = match fs::read_dir(&self.root) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => {
        return Err(StoreError::ReadDir {
          path: self.root.clone(),
          source,
        });
      }
    };

    let mut snapshots = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|source| StoreError::ReadDir {
        path: self.root.clone(),
        source,
      })?;
      let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
      if !is_dir {
        continue;
      }
      if let Some(index) = entry.file_name().to_str().and_then(|name| self.parse_index(name)) {
        snapshots.push(SnapshotEntry {
          index,
          path: entry.path(),
        });
      }
    }
    snapshots.sort_by_key(|s| s.index);
    Ok(snapshots)
  }

  pub fn last_index(&self) -> Result<Option<usize>, StoreError> {
    Ok(self.list()?.last().map(|s| s.index))
  }

  /// The snapshot with the greatest index, if any.
  pub fn last_build_dir(&self) -> Result<Option<PathBuf>, StoreError> {
    Ok(self.list()?.pop().map(|s| s.path))
  }

  /// Snapshot `index`, failing if it was never created.
  pub fn existing_build_dir(&self, index: usize) -> Result<PathBuf, StoreError> {
    let dir = self.build_dir(index);
    if dir.is_dir() {
      Ok(dir)
    } else {
      Err(StoreError::SnapshotNotFound(index))
    }
  }

  /// Create the next snapshot directory, creating the archive root if needed.
  pub fn new_build_dir(&self) -> Result<PathBuf, StoreError> {
    self.ensure_root()?;
    let index = self.last_index()?.map_or(0, |last| last + 1);
    let dir = self.build_dir(index);
    fs::create_dir(&dir).map_err(|source| StoreError::CreateDir {
      path: dir.clone(),
      source,
    })?;
    debug!(dir = %dir.display(), "created snapshot directory");
    Ok(dir)
  }

  pub fn ensure_root(&self) -> Result<(), StoreError> {
    fs::create_dir_all(&self.root).map_err(|source| StoreError::CreateDir {
      path: self.root.clone(),
      source,
    })
  }

  /// Read the configuration record of `dir`.
  ///
  /// A snapshot without a record (or no snapshot at all) yields an empty config.
  pub fn load_config(&self, dir: &Path) -> Result<BuildConfig, StoreError> {
    let path = dir.join(CONFIG_FILENAME);
    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BuildConfig::new()),
      Err(source) => return Err(StoreError::ReadConfig { path, source }),
    };
    serde_json::from_str(&content).map_err(|source| StoreError::ParseConfig { path, source })
  }

  /// Write the configuration record of `dir` atomically.
  pub fn save_config(&self, dir: &Path, config: &BuildConfig) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(config).map_err(|e| StoreError::WriteConfig {
      path: dir.join(CONFIG_FILENAME),
      source: io::Error::other(e),
    })?;
    write_atomic(&dir.join(CONFIG_FILENAME), &content)
  }

  pub fn save_summary(&self, dir: &Path, summary: &str) -> Result<(), StoreError> {
    write_atomic(&dir.join(SUMMARY_FILENAME), summary)
  }

  pub fn load_summary(&self, dir: &Path) -> Result<Option<String>, StoreError> {
    let path = dir.join(SUMMARY_FILENAME);
    match fs::read_to_string(&path) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(source) => Err(StoreError::ReadConfig { path, source }),
    }
  }

  /// Take the writer lock, creating the archive root first.
  pub fn lock(&self, command: &str) -> Result<StoreLock, StoreError> {
    self.ensure_root()?;
    Ok(StoreLock::acquire(&self.root, command)?)
  }
}

/// Write to a temp file next to `path`, then rename over it.
fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
  let mut temp_name = path.as_os_str().to_owned();
  temp_name.push(".tmp");
  let temp_path = PathBuf::from(temp_name);

  let write_err = |source| StoreError::WriteConfig {
    path: path.to_path_buf(),
    source,
  };
  fs::write(&temp_path, content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;
  Ok(())
}
