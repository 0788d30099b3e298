//! Recursive tree copy and removal.

use std::fs;
use std::io;
use std::path::Path;

use tracing::info;

use crate::error::{InstallerError, IoContext, Result};

use super::paths::resolve_path;
use super::permissions::{PermissionPolicy, apply_permissions};

/// Copy every file and directory of `src` into `dst`, then apply the
/// standard permission policy to `dst`.
///
/// Fails with [`InstallerError::Copy`] when `src` is missing or not a
/// directory, or when `dst` is `src` or lies inside it.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Err(copy_error(src, dst, "source does not exist", None));
    }
    if !src.is_dir() {
        return Err(copy_error(src, dst, "source is not a directory", None));
    }
    let src_resolved = resolve_path(src);
    let dst_resolved = resolve_path(dst);
    if dst_resolved == src_resolved {
        return Err(copy_error(src, dst, "source and destination are the same", None));
    }
    if dst_resolved.starts_with(&src_resolved) {
        return Err(copy_error(src, dst, "destination is inside the source", None));
    }

    fs::create_dir_all(dst)
        .map_err(|e| copy_error(src, dst, "failed to create destination", Some(e)))?;
    copy_entries(src, dst).map_err(|e| copy_error(src, dst, &e.to_string(), Some(e)))?;
    apply_permissions(dst, PermissionPolicy::STANDARD)?;

    info!(src = %src.display(), dst = %dst.display(), "tree copied");
    Ok(())
}

fn copy_entries(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if ty.is_dir() {
            fs::create_dir_all(&to)?;
            copy_entries(&from, &to)?;
        } else if ty.is_symlink() {
            copy_symlink(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_dir() {
        fs::create_dir_all(to)?;
        copy_entries(from, to)
    } else {
        fs::copy(from, to).map(|_| ())
    }
}

fn copy_error(src: &Path, dst: &Path, message: &str, source: Option<io::Error>) -> InstallerError {
    InstallerError::Copy {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        message: message.to_string(),
        source,
    }
}

/// Remove `path` and everything under it.
pub fn remove_tree(path: &Path) -> Result<()> {
    fs::remove_dir_all(path)
        .io_context(|| format!("Failed to delete directory: {}", path.display()))?;
    info!(path = %path.display(), "tree deleted");
    Ok(())
}

/// Create `path` and its parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .io_context(|| format!("Failed to create directory: {}", path.display()))
}
