//! Config store for loading `installer.toml`.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{parser, schema::InstallerToml};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store for `<home>/etc/info/installer.toml`.
    pub fn for_home(home: &Path) -> Self {
        Self::from_path(super::info_dir(home).join("installer.toml"))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// A missing file yields defaults.
    pub fn load(&self) -> Result<InstallerToml> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no installer.toml, using defaults");
            return Ok(InstallerToml::default());
        }
        parser::parse_installer_toml(&self.config_path)
    }
}
