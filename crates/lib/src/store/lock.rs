//! Single-writer lock over a snapshot archive.
//!
//! Allocating the next snapshot index is a read-then-create sequence, so only
//! one runner may write to an archive at a time. Listing and inspecting
//! snapshots only reads finished directories and takes no lock.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{APP_NAME, LOCK_FILENAME};

/// The runner currently holding the archive, as recorded in the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
  pub pid: u32,
  pub since_unix: u64,
  pub command: String,
}

impl LockHolder {
  fn current(command: &str) -> Self {
    Self {
      pid: std::process::id(),
      since_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default(),
      command: command.to_string(),
    }
  }

  fn describe(holder: Option<&LockHolder>) -> String {
    match holder {
      Some(holder) => format!(
        "`{} {}` (pid {}, since unix time {})",
        APP_NAME, holder.command, holder.pid, holder.since_unix
      ),
      None => "another process".to_string(),
    }
  }
}

#[derive(Debug, Error)]
pub enum StoreLockError {
  #[error("archive is busy: held by {holder}; remove {lock_path} if that process is gone")]
  Busy { holder: String, lock_path: PathBuf },

  #[error("failed to lock {lock_path}: {source}")]
  Io {
    lock_path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The held archive lock. Dropping it closes the file and releases the lock.
#[derive(Debug)]
pub struct StoreLock {
  file: File,
  lock_path: PathBuf,
}

impl StoreLock {
  /// Take the lock on `archive` without waiting. `archive` must exist.
  pub fn acquire(archive: &Path, command: &str) -> Result<Self, StoreLockError> {
    let lock_path = archive.join(LOCK_FILENAME);
    let io_err = |source: io::Error| StoreLockError::Io {
      lock_path: lock_path.clone(),
      source,
    };

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(io_err)?;

    if !try_lock_exclusive(&file).map_err(io_err)? {
      let holder = read_holder(&lock_path);
      return Err(StoreLockError::Busy {
        holder: LockHolder::describe(holder.as_ref()),
        lock_path: lock_path.clone(),
      });
    }

    let lock = StoreLock {
      file,
      lock_path: lock_path.clone(),
    };
    lock.write_holder(&LockHolder::current(command)).map_err(io_err)?;
    debug!(path = %lock.lock_path.display(), "archive locked");
    Ok(lock)
  }

  /// What this lock recorded about its holder.
  pub fn holder(&self) -> io::Result<LockHolder> {
    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }

  fn write_holder(&self, holder: &LockHolder) -> io::Result<()> {
    let mut file = &self.file;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    serde_json::to_writer(&mut file, holder).map_err(io::Error::other)?;
    file.flush()
  }
}

fn read_holder(lock_path: &Path) -> Option<LockHolder> {
  let contents = std::fs::read_to_string(lock_path).ok()?;
  serde_json::from_str(&contents).ok()
}

/// `Ok(false)` when someone else holds the lock.
#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
  use rustix::fs::{FlockOperation, flock};

  match flock(file, FlockOperation::NonBlockingLockExclusive) {
    Ok(()) => Ok(true),
    Err(errno) if errno == rustix::io::Errno::WOULDBLOCK => Ok(false),
    Err(errno) => Err(io::Error::from_raw_os_error(errno.raw_os_error())),
  }
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  // SAFETY: a zeroed OVERLAPPED locks from offset 0; `handle` stays open for the call.
  let locked = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
      0,
      1,
      0,
      &mut overlapped,
    )
  };
  if locked != 0 {
    return Ok(true);
  }
  let err = io::Error::last_os_error();
  if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
    Ok(false)
  } else {
    Err(err)
  }
}
