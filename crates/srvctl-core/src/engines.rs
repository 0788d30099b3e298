//! Locally installed engine runtimes.
//!
//! Engines live under `<home>/engines/<engine-name>/<engine-name>-<version>`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, IoContext, Result};
use crate::types::ServerType;

#[derive(Debug, Clone)]
pub struct EngineCatalog {
    engines_dir: PathBuf,
}

impl EngineCatalog {
    pub fn new(engines_dir: impl Into<PathBuf>) -> Self {
        Self {
            engines_dir: engines_dir.into(),
        }
    }

    pub fn engines_dir(&self) -> &Path {
        &self.engines_dir
    }

    pub fn engine_root(&self, server_type: ServerType) -> PathBuf {
        self.engines_dir.join(server_type.engine_name())
    }

    pub fn engine_dir(&self, server_type: ServerType, version: &str) -> PathBuf {
        self.engine_root(server_type)
            .join(format!("{}-{version}", server_type.engine_name()))
    }

    /// Installed versions, oldest first. A missing engines directory means none.
    pub fn installed_versions(&self, server_type: ServerType) -> Result<Vec<String>> {
        let root = self.engine_root(server_type);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}-", server_type.engine_name());
        let mut versions = Vec::new();
        for entry in fs::read_dir(&root)
            .io_context(|| format!("Failed to list engines: {}", root.display()))?
        {
            let entry =
                entry.io_context(|| format!("Failed to list engines: {}", root.display()))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(version) = name.strip_prefix(&prefix)
                && !version.is_empty()
            {
                versions.push(version.to_string());
            }
        }
        versions.sort_by(|a, b| compare_versions(a, b));
        Ok(versions)
    }

    pub fn latest(&self, server_type: ServerType) -> Result<Option<String>> {
        Ok(self.installed_versions(server_type)?.pop())
    }

    /// Latest installed version, failing when nothing is installed.
    pub fn require_latest(&self, server_type: ServerType) -> Result<String> {
        self.latest(server_type)?.ok_or_else(|| {
            InstallerError::not_found(format!(
                "{} engine is not installed under {}",
                server_type.engine_name(),
                self.engine_root(server_type).display()
            ))
        })
    }

    pub fn is_installed(&self, server_type: ServerType, version: &str) -> Result<bool> {
        Ok(self
            .installed_versions(server_type)?
            .iter()
            .any(|v| v == version))
    }
}

/// `major.minor` prefix of a dotted version.
pub fn major_minor(version: &str) -> Result<String> {
    let mut parts = version.trim().split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) if !major.is_empty() && !minor.is_empty() => {
            Ok(format!("{major}.{minor}"))
        }
        _ => Err(InstallerError::validation(format!(
            "Version '{version}' has no major.minor segments"
        ))),
    }
}

/// Segment-wise comparison; numeric segments compare numerically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
