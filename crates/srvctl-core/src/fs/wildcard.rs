use std::fs;
use std::path::Path;

use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::error::{InstallerError, IoContext, Result};

/// Delete every file under `dir` whose name matches `pattern` (e.g. `*.pid`).
/// Returns the number of files removed.
pub fn delete_by_wildcard(dir: &Path, pattern: &str) -> Result<usize> {
    let glob = Glob::new(pattern)
        .map_err(|e| InstallerError::validation(format!("Invalid pattern '{pattern}': {e}")))?;

    let mut removed = 0;
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        if glob.matched(&CandidatePath::from(name.as_ref())).is_some() {
            fs::remove_file(entry.path())
                .io_context(|| format!("Failed to delete {}", entry.path().display()))?;
            tracing::debug!(path = %entry.path().display(), "deleted");
            removed += 1;
        }
    }
    Ok(removed)
}
