//! Application context for unified dependency injection.

use crate::config::InstallerConfig;
use crate::engines::EngineCatalog;
use crate::installer::Installer;
use crate::process::{InstanceControl, ProcessControl};
use crate::registry::RegistryStore;
use crate::release::TemplateResolver;

/// Unified application context.
///
/// Front ends build this once from the resolved configuration and ask it
/// for the services a command needs.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: InstallerConfig,
}

impl AppContext {
    pub fn new(config: InstallerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn registry_store(&self) -> RegistryStore {
        RegistryStore::new(self.config.registry_path())
    }

    pub fn engine_catalog(&self) -> EngineCatalog {
        EngineCatalog::new(self.config.engines_dir())
    }

    pub fn template_resolver(&self) -> TemplateResolver {
        TemplateResolver::new(
            self.config.depot_layout(),
            self.config.release_manifest_path(),
            self.config.depot_dir(),
            self.engine_catalog(),
        )
    }

    /// Installer driving real processes.
    pub fn installer(&self) -> Installer<'_, ProcessControl> {
        Installer::new(&self.config, ProcessControl::new())
    }

    /// Installer with a caller-supplied process control.
    pub fn installer_with<C: InstanceControl>(&self, control: C) -> Installer<'_, C> {
        Installer::new(&self.config, control)
    }
}
