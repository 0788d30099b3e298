//! Permission normalisation for materialised trees.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{InstallerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl PermissionPolicy {
    /// Applied to every copied tree.
    pub const STANDARD: Self = Self {
        dir_mode: 0o755,
        file_mode: 0o755,
    };

    /// Owner-only access, for credential and config subtrees.
    pub const SECURE: Self = Self {
        dir_mode: 0o700,
        file_mode: 0o600,
    };
}

/// Apply `policy` to `root` and everything beneath it. Symlinks are left
/// alone; a missing `root` is a no-op. Modes are only changed on Unix.
pub fn apply_permissions(root: &Path, policy: PermissionPolicy) -> Result<()> {
    if !root.exists() {
        tracing::debug!(path = %root.display(), "permission target missing, skipped");
        return Ok(());
    }

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let context = format!("Failed to walk {}", root.display());
            match e.into_io_error() {
                Some(source) => InstallerError::io(context, source),
                None => InstallerError::io(context, std::io::Error::other("filesystem loop")),
            }
        })?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            continue;
        }
        let mode = if file_type.is_dir() {
            policy.dir_mode
        } else {
            policy.file_mode
        };
        set_mode(entry.path(), mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    use crate::error::IoContext;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .io_context(|| format!("Failed to chmod {:o} {}", mode, path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
