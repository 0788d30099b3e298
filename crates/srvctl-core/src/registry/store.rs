//! Registry persistence.
//!
//! Every operation reads the whole document, edits its `<server>` nodes in
//! memory and writes the whole tree back through a temp file and a rename,
//! so a reader never observes a half-written registry. Concurrent invocations
//! are not coordinated.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{InstallerError, IoContext, Result};
use crate::rewrite::xml::XmlDocument;

use super::schema::{InstallInfo, ServerRecord};

/// Registry timestamp, `yyyyMMddHHmmssSSS` in local time.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S%3f").to_string()
}

#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry. A missing file reads as an empty registry.
    pub fn load(&self) -> Result<InstallInfo> {
        if !self.path.exists() {
            return Ok(InstallInfo::default());
        }
        let content = fs::read_to_string(&self.path)
            .io_context(|| format!("Failed to read registry: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(InstallInfo::default());
        }
        let doc = XmlDocument::parse(&self.path, content.as_bytes())?;
        InstallInfo::from_document(&self.path, doc)
    }

    /// Save the registry atomically (tmp + rename).
    pub fn save(&self, info: &InstallInfo) -> Result<()> {
        let document = info.document().render(&self.path, "  ")?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .io_context(|| format!("Failed to create registry directory: {}", parent.display()))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "install-info.xml".to_string());
        let tmp_path = parent.join(format!("{file_name}.{}.tmp", std::process::id()));

        fs::write(&tmp_path, document)
            .io_context(|| format!("Failed to write tmp registry: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .io_context(|| format!("Failed to replace registry: {}", self.path.display()))?;

        debug!(path = %self.path.display(), servers = info.records().len(), "registry saved");
        Ok(())
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.load()?.contains(id))
    }

    pub fn get(&self, id: &str) -> Result<ServerRecord> {
        self.load()?
            .find(id)
            .cloned()
            .ok_or_else(|| InstallerError::not_found(format!("{id} doesn't exist")))
    }

    /// Install path of `id`, or `None` when the server is unknown or its path is blank.
    pub fn install_path(&self, id: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .load()?
            .find(id)
            .map(|s| s.path.clone())
            .filter(|p| !p.as_os_str().is_empty()))
    }

    pub fn service_port(&self, id: &str) -> Result<String> {
        self.get(id).map(|s| s.port)
    }

    pub fn list(&self) -> Result<Vec<ServerRecord>> {
        Ok(self.load()?.into_records())
    }

    /// Append `record` with fresh timestamps and return the stored copy.
    ///
    /// Uniqueness is checked against the document as read right now, even if
    /// the caller already checked earlier.
    pub fn add(&self, mut record: ServerRecord) -> Result<ServerRecord> {
        let mut info = self.load()?;
        if info.contains(&record.id) {
            return Err(InstallerError::DuplicateId {
                id: record.id.clone(),
            });
        }

        let now = timestamp_now();
        record.cdate = now.clone();
        record.udate = now;
        info.push(record.clone());
        self.save(&info)?;

        info!(id = %record.id, server_type = %record.server_type, path = %record.path.display(), "server registered");
        Ok(record)
    }

    pub fn remove(&self, id: &str) -> Result<ServerRecord> {
        let mut info = self.load()?;
        let removed = info
            .remove(id)
            .ok_or_else(|| InstallerError::not_found(format!("{id} doesn't exist")))?;
        self.save(&info)?;

        info!(id = %id, "server unregistered");
        Ok(removed)
    }

    /// Refresh `udate` of an existing record.
    pub fn touch(&self, id: &str) -> Result<()> {
        let mut info = self.load()?;
        if !info.set_udate(id, &timestamp_now()) {
            return Err(InstallerError::not_found(format!("{id} doesn't exist")));
        }
        self.save(&info)
    }
}
