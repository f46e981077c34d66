//! Publishing reused artifacts into a new snapshot.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::StoreError;

/// How an artifact ended up in the new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMethod {
  HardLink,
  /// At least one file had to be copied because hard linking failed.
  Copy,
  /// Every file was already present at the destination and left untouched.
  Existing,
}

/// Duplicate `src` (a file or a directory tree) at `dst` using hard links.
///
/// Directories are recreated and their files linked one by one. A file that
/// already exists at the destination is left alone, since another job sharing
/// that output may have published it. A file that cannot be hard linked
/// (cross-device, unsupported filesystem) is copied instead.
pub fn link_artifact(src: &Path, dst: &Path) -> Result<LinkMethod, StoreError> {
  let link_err = |source: io::Error| StoreError::Link {
    src: src.to_path_buf(),
    dst: dst.to_path_buf(),
    source,
  };

  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent).map_err(link_err)?;
  }

  let metadata = fs::symlink_metadata(src).map_err(link_err)?;
  if !metadata.is_dir() {
    return link_file(src, dst);
  }

  let mut method = LinkMethod::Existing;
  for entry in WalkDir::new(src) {
    let entry = entry.map_err(|e| link_err(io::Error::other(e)))?;
    let relative = entry.path().strip_prefix(src).map_err(|e| link_err(io::Error::other(e)))?;
    let target = dst.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(link_err)?;
      continue;
    }
    method = match (method, link_file(entry.path(), &target)?) {
      (LinkMethod::Copy, _) | (_, LinkMethod::Copy) => LinkMethod::Copy,
      (LinkMethod::HardLink, _) | (_, LinkMethod::HardLink) => LinkMethod::HardLink,
      _ => LinkMethod::Existing,
    };
  }
  Ok(method)
}

fn link_file(src: &Path, dst: &Path) -> Result<LinkMethod, StoreError> {
  let link_err = |source: io::Error| StoreError::Link {
    src: src.to_path_buf(),
    dst: dst.to_path_buf(),
    source,
  };

  if fs::symlink_metadata(dst).is_ok() {
    debug!(dst = %dst.display(), "already published");
    return Ok(LinkMethod::Existing);
  }

  match fs::hard_link(src, dst) {
    Ok(()) => Ok(LinkMethod::HardLink),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(LinkMethod::Existing),
    Err(e) => {
      warn!(src = %src.display(), dst = %dst.display(), error = %e, "hard link failed, copying");
      // `create_new` so a copy can never truncate a file that shares an inode with `src`.
      let mut reader = fs::File::open(src).map_err(link_err)?;
      let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(link_err)?;
      io::copy(&mut reader, &mut writer).map_err(link_err)?;
      let permissions = reader.metadata().map_err(link_err)?.permissions();
      fs::set_permissions(dst, permissions).map_err(link_err)?;
      Ok(LinkMethod::Copy)
    }
  }
}
