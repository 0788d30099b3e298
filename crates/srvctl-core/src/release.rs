//! Template resolution from the release manifest or the engine catalog.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::DepotLayout;
use crate::engines::{EngineCatalog, major_minor};
use crate::error::{InstallerError, IoContext, Result};
use crate::types::ServerType;

/// A read-only template tree and the version it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub path: PathBuf,
    pub version: String,
}

/// `release-info.xml`: `release/depot/modules/module{id, version}`.
#[derive(Debug, Default, Deserialize)]
struct ReleaseManifest {
    #[serde(default)]
    depot: ManifestDepot,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestDepot {
    #[serde(default)]
    modules: ManifestModules,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestModules {
    #[serde(default)]
    module: Vec<ManifestModule>,
}

#[derive(Debug, Deserialize)]
struct ManifestModule {
    id: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TemplateResolver {
    layout: DepotLayout,
    manifest_path: PathBuf,
    depot_dir: PathBuf,
    catalog: EngineCatalog,
}

impl TemplateResolver {
    pub fn new(
        layout: DepotLayout,
        manifest_path: PathBuf,
        depot_dir: PathBuf,
        catalog: EngineCatalog,
    ) -> Self {
        Self {
            layout,
            manifest_path,
            depot_dir,
            catalog,
        }
    }

    pub fn resolve_depot_path(&self, server_type: ServerType) -> Result<TemplateSource> {
        let source = match self.layout {
            DepotLayout::Release => {
                let version = self.module_version(server_type)?;
                TemplateSource {
                    path: self.depot_dir.join(server_type.as_str()).join(&version),
                    version,
                }
            }
            DepotLayout::Engine => {
                let version = self.catalog.require_latest(server_type)?;
                let tag = server_type.as_str();
                let dir = format!("base-{tag}-{}", major_minor(&version)?);
                TemplateSource {
                    path: self.depot_dir.join("template").join(tag).join(dir),
                    version,
                }
            }
        };
        debug!(server_type = %server_type, path = %source.path.display(), version = %source.version, "template resolved");
        Ok(source)
    }

    /// Current module version for `server_type` in the release manifest.
    pub fn module_version(&self, server_type: ServerType) -> Result<String> {
        let manifest = load_manifest(&self.manifest_path)?;
        manifest
            .depot
            .modules
            .module
            .into_iter()
            .find(|m| m.id.trim() == server_type.as_str())
            .and_then(|m| m.version)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| InstallerError::InvalidModule {
                server_type: server_type.to_string(),
            })
    }
}

fn load_manifest(path: &Path) -> Result<ReleaseManifest> {
    if !path.is_file() {
        return Err(InstallerError::ManifestMissing {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)
        .io_context(|| format!("Failed to read release manifest: {}", path.display()))?;
    quick_xml::de::from_str(&content).map_err(|e| InstallerError::malformed(path, e))
}
