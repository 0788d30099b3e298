//! Path comparison helpers.

use std::path::{Component, Path, PathBuf};

/// Canonical form of `path`. `.` and `..` are folded lexically first, then
/// missing trailing components are re-attached to the canonicalised nearest
/// existing ancestor.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let absolute = lexical_normalize(&absolute);

    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name);
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing
        .canonicalize()
        .unwrap_or_else(|_| existing.to_path_buf());
    for name in rest.into_iter().rev() {
        resolved.push(name);
    }
    resolved
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True when `child` is `base` itself or lies beneath it, compared
/// component-wise on resolved paths.
pub fn is_subdirectory(base: &Path, child: &Path) -> bool {
    if base.as_os_str().is_empty() || child.as_os_str().is_empty() {
        return false;
    }
    resolve_path(child).starts_with(resolve_path(base))
}
