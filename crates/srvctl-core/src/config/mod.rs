//! Installer configuration.
//!
//! One immutable [`InstallerConfig`] is built at process start and handed to
//! every component. Values are layered, highest precedence first:
//! - explicit home override (CLI `--home`)
//! - environment (`SRVCTL_HOME`, `JAVA_HOME`, `HOSTNAME`, `USER`, `SRVCTL_ROOT_USER_ALLOWED`)
//! - `<home>/etc/info/installer.toml`
//! - built-in defaults

pub mod parser;
pub mod schema;
pub mod store;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InstallerError, Result};
use crate::types::ServerType;

pub use parser::{parse_installer_toml, parse_installer_toml_str};
pub use schema::{InstallerToml, TypeDefaultsEntry};
pub use store::ConfigStore;

pub const HOME_ENV: &str = "SRVCTL_HOME";
pub const ROOT_USER_ALLOWED_ENV: &str = "SRVCTL_ROOT_USER_ALLOWED";

/// How depot templates are laid out under `<home>/depot`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepotLayout {
    /// `depot/<type>/<version>` keyed by the release manifest.
    #[default]
    Release,
    /// `depot/template/<type>/base-<type>-<major.minor>` keyed by the latest installed engine.
    Engine,
}

/// Defaults applied when an operation leaves a field blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefaults {
    pub service_port: String,
    /// Falls back to the global run user when unset.
    pub run_user: Option<String>,
    pub ajp_address: String,
    pub jvm_route: String,
    pub install_root: Option<PathBuf>,
    pub secondary_service_port: String,
}

impl TypeDefaults {
    pub fn builtin(server_type: ServerType) -> Self {
        let (service_port, secondary) = match server_type {
            ServerType::Web => ("80", ""),
            ServerType::Was => ("8080", ""),
            ServerType::Session => ("5180", "5181"),
        };
        Self {
            service_port: service_port.to_string(),
            run_user: None,
            ajp_address: "127.0.0.1".to_string(),
            jvm_route: "host1_8180".to_string(),
            install_root: None,
            secondary_service_port: secondary.to_string(),
        }
    }

    fn overlay(mut self, entry: &TypeDefaultsEntry) -> Self {
        if let Some(v) = &entry.service_port {
            self.service_port = v.clone();
        }
        if entry.run_user.is_some() {
            self.run_user = entry.run_user.clone();
        }
        if let Some(v) = &entry.ajp_address {
            self.ajp_address = v.clone();
        }
        if let Some(v) = &entry.jvm_route {
            self.jvm_route = v.clone();
        }
        if entry.install_root.is_some() {
            self.install_root = entry.install_root.clone();
        }
        if let Some(v) = &entry.secondary_service_port {
            self.secondary_service_port = v.clone();
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct InstallerConfig {
    home: PathBuf,
    java_home: String,
    hostname: String,
    run_user: String,
    root_user_allowed: bool,
    depot_layout: DepotLayout,
    clone_install_root: Option<PathBuf>,
    web: TypeDefaults,
    was: TypeDefaults,
    session: TypeDefaults,
}

impl InstallerConfig {
    /// Built-in defaults rooted at `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            java_home: String::new(),
            hostname: "localhost".to_string(),
            run_user: "srvctl".to_string(),
            root_user_allowed: false,
            depot_layout: DepotLayout::Release,
            clone_install_root: None,
            web: TypeDefaults::builtin(ServerType::Web),
            was: TypeDefaults::builtin(ServerType::Was),
            session: TypeDefaults::builtin(ServerType::Session),
        }
    }

    /// Resolve from the process environment and `installer.toml`.
    pub fn load(home_override: Option<PathBuf>) -> Result<Self> {
        Self::load_with(home_override, |key| std::env::var(key).ok())
    }

    /// Same as [`InstallerConfig::load`] with an injectable environment.
    pub fn load_with<F>(home_override: Option<PathBuf>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let home = match home_override.or_else(|| env(HOME_ENV).map(PathBuf::from)) {
            Some(home) => home,
            None => dirs::home_dir()
                .map(|h| h.join("srvctl"))
                .ok_or_else(|| InstallerError::validation("Could not determine home directory"))?,
        };

        let file = ConfigStore::for_home(&home).load()?;
        let mut config = Self::new(home).apply_file(&file);

        if let Some(v) = env("JAVA_HOME") {
            config.java_home = v;
        }
        if let Some(v) = env("HOSTNAME") {
            config.hostname = v;
        }
        if let Some(v) = env("USER") {
            config.run_user = v;
        }
        if let Some(v) = env(ROOT_USER_ALLOWED_ENV) {
            config.root_user_allowed = v.trim().eq_ignore_ascii_case("true");
        }

        tracing::debug!(home = %config.home.display(), layout = ?config.depot_layout, "configuration resolved");
        Ok(config)
    }

    fn apply_file(mut self, file: &InstallerToml) -> Self {
        if let Some(v) = &file.java_home {
            self.java_home = v.clone();
        }
        if let Some(v) = &file.hostname {
            self.hostname = v.clone();
        }
        if let Some(v) = &file.run_user {
            self.run_user = v.clone();
        }
        if let Some(v) = file.root_user_allowed {
            self.root_user_allowed = v;
        }
        if let Some(v) = file.depot_layout {
            self.depot_layout = v;
        }
        if file.clone_install_root.is_some() {
            self.clone_install_root = file.clone_install_root.clone();
        }
        self.web = self.web.overlay(&file.web);
        self.was = self.was.overlay(&file.was);
        self.session = self.session.overlay(&file.session);
        self
    }

    pub fn with_java_home(mut self, java_home: impl Into<String>) -> Self {
        self.java_home = java_home.into();
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_run_user(mut self, run_user: impl Into<String>) -> Self {
        self.run_user = run_user.into();
        self
    }

    pub fn with_root_user_allowed(mut self, allowed: bool) -> Self {
        self.root_user_allowed = allowed;
        self
    }

    pub fn with_depot_layout(mut self, layout: DepotLayout) -> Self {
        self.depot_layout = layout;
        self
    }

    pub fn with_clone_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.clone_install_root = Some(root.into());
        self
    }

    pub fn with_type_defaults(mut self, server_type: ServerType, defaults: TypeDefaults) -> Self {
        match server_type {
            ServerType::Web => self.web = defaults,
            ServerType::Was => self.was = defaults,
            ServerType::Session => self.session = defaults,
        }
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn java_home(&self) -> &str {
        &self.java_home
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn run_user(&self) -> &str {
        &self.run_user
    }

    pub fn root_user_allowed(&self) -> bool {
        self.root_user_allowed
    }

    pub fn depot_layout(&self) -> DepotLayout {
        self.depot_layout
    }

    pub fn clone_install_root(&self) -> Option<&Path> {
        self.clone_install_root.as_deref()
    }

    pub fn defaults(&self, server_type: ServerType) -> &TypeDefaults {
        match server_type {
            ServerType::Web => &self.web,
            ServerType::Was => &self.was,
            ServerType::Session => &self.session,
        }
    }

    /// Run user for a type: the type override, else the global run user.
    pub fn default_run_user(&self, server_type: ServerType) -> &str {
        self.defaults(server_type)
            .run_user
            .as_deref()
            .unwrap_or(&self.run_user)
    }

    /// Parent directory for new instances of `server_type`.
    pub fn install_root(&self, server_type: ServerType) -> PathBuf {
        self.defaults(server_type)
            .install_root
            .clone()
            .unwrap_or_else(|| self.home.join("instances").join(server_type.as_str()))
    }

    pub fn registry_path(&self) -> PathBuf {
        info_dir(&self.home).join("install-info.xml")
    }

    pub fn release_manifest_path(&self) -> PathBuf {
        info_dir(&self.home).join("release-info.xml")
    }

    pub fn depot_dir(&self) -> PathBuf {
        self.home.join("depot")
    }

    pub fn engines_dir(&self) -> PathBuf {
        self.home.join("engines")
    }

    /// Doc base written into a new `was` instance's ROOT context.
    pub fn sample_application_dir(&self) -> PathBuf {
        self.depot_dir().join("sample-application").join("ROOT")
    }
}

pub(crate) fn info_dir(home: &Path) -> PathBuf {
    home.join("etc").join("info")
}
