//! Schema of the optional `installer.toml` defaults file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{InstallerError, Result};

use super::DepotLayout;

/// Root of `installer.toml`. Every field is optional; unset values fall
/// through to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerToml {
    pub java_home: Option<String>,
    pub hostname: Option<String>,
    pub run_user: Option<String>,
    pub root_user_allowed: Option<bool>,
    pub depot_layout: Option<DepotLayout>,
    /// Parent directory for clones. Defaults to the source's parent.
    pub clone_install_root: Option<PathBuf>,
    pub web: TypeDefaultsEntry,
    pub was: TypeDefaultsEntry,
    pub session: TypeDefaultsEntry,
}

/// Per server-type overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeDefaultsEntry {
    pub service_port: Option<String>,
    pub run_user: Option<String>,
    pub ajp_address: Option<String>,
    pub jvm_route: Option<String>,
    pub install_root: Option<PathBuf>,
    pub secondary_service_port: Option<String>,
}

impl InstallerToml {
    pub fn validate(&self) -> Result<()> {
        for (tag, entry) in [
            ("web", &self.web),
            ("was", &self.was),
            ("session", &self.session),
        ] {
            entry.validate(tag)?;
        }
        Ok(())
    }
}

impl TypeDefaultsEntry {
    fn validate(&self, tag: &str) -> Result<()> {
        for (key, value) in [
            ("service_port", &self.service_port),
            ("secondary_service_port", &self.secondary_service_port),
        ] {
            if let Some(port) = value
                && !crate::types::is_numeric(port)
            {
                return Err(InstallerError::validation(format!(
                    "[{tag}] {key} should be numeric, got '{port}'"
                )));
            }
        }
        Ok(())
    }
}
