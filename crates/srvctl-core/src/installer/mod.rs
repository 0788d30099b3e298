//! Installer state machine.
//!
//! Each [`Operation`] runs through the phases
//! `PendingInput -> Validating -> MaterializingFiles -> RewritingConfig ->
//! RegisteringRecord -> Done`, or ends in `Failed`. Nothing is rolled back:
//! a failure after `MaterializingFiles` leaves the target directory on disk
//! and is logged with its path.

mod clone;
mod create;
mod delete;
mod modify;
pub mod params;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::InstallerConfig;
use crate::engines::EngineCatalog;
use crate::error::{InstallerError, Result};
use crate::process::InstanceControl;
use crate::registry::RegistryStore;
use crate::release::TemplateResolver;
use crate::types::{ServerType, is_numeric};

pub use params::{
    CloneParams, CreateSessionParams, CreateWasParams, CreateWebParams, DeleteParams,
    ModifyEngineParams,
};

/// Per-instance environment file rewritten by every installer.
pub const ENV_FILE: &str = "env.sh";
/// Directory that receives the owner-only permission policy.
pub const SECURE_CONF_DIR: &str = "conf";
/// Product home variable written into instance environment files.
pub const HOME_VARIABLE: &str = "SRVCTL_HOME";

/// One fully specified mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateWeb(CreateWebParams),
    CreateWas(CreateWasParams),
    CreateSession(CreateSessionParams),
    CloneWeb(CloneParams),
    CloneWas(CloneParams),
    Delete(DeleteParams),
    ModifyEngine(ModifyEngineParams),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateWeb(_) | Operation::CreateWas(_) | Operation::CreateSession(_) => {
                "create"
            }
            Operation::CloneWeb(_) | Operation::CloneWas(_) => "clone",
            Operation::Delete(_) => "delete",
            Operation::ModifyEngine(_) => "modify-engine",
        }
    }

    pub fn server_type(&self) -> ServerType {
        match self {
            Operation::CreateWeb(_) | Operation::CloneWeb(_) => ServerType::Web,
            Operation::CreateWas(_) | Operation::CloneWas(_) => ServerType::Was,
            Operation::CreateSession(_) => ServerType::Session,
            Operation::Delete(p) => p.server_type,
            Operation::ModifyEngine(p) => p.server_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum InstallPhase {
    PendingInput,
    Validating,
    MaterializingFiles,
    RewritingConfig,
    RegisteringRecord,
    Done,
    Failed,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallPhase::PendingInput => "pending-input",
            InstallPhase::Validating => "validating",
            InstallPhase::MaterializingFiles => "materializing-files",
            InstallPhase::RewritingConfig => "rewriting-config",
            InstallPhase::RegisteringRecord => "registering-record",
            InstallPhase::Done => "done",
            InstallPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records the current phase and the directory being mutated.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    operation: &'static str,
    phase: InstallPhase,
    target: Option<PathBuf>,
}

impl PhaseTracker {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            phase: InstallPhase::PendingInput,
            target: None,
        }
    }

    pub(crate) fn advance(&mut self, next: InstallPhase) {
        debug!(operation = self.operation, from = %self.phase, to = %next, "phase");
        self.phase = next;
    }

    pub(crate) fn set_target(&mut self, target: &Path) {
        self.target = Some(target.to_path_buf());
    }

    fn fail(&mut self, error: &InstallerError) {
        let failed_in = self.phase;
        self.advance(InstallPhase::Failed);
        match (&self.target, failed_in >= InstallPhase::MaterializingFiles) {
            (Some(target), true) => warn!(
                operation = self.operation,
                phase = %failed_in,
                path = %target.display(),
                error = %error,
                "operation failed after filesystem changes; partial state left on disk"
            ),
            _ => debug!(operation = self.operation, phase = %failed_in, error = %error, "operation rejected"),
        }
    }
}

/// Outcome of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub operation: &'static str,
    pub server_type: ServerType,
    pub server_id: String,
    pub path: PathBuf,
    pub port: Option<String>,
    pub version: Option<String>,
    pub warnings: Vec<String>,
}

impl InstallReport {
    fn new(op: &Operation, server_id: &str, path: &Path) -> Self {
        Self {
            operation: op.name(),
            server_type: op.server_type(),
            server_id: server_id.to_string(),
            path: path.to_path_buf(),
            port: None,
            version: None,
            warnings: Vec::new(),
        }
    }
}

/// Runs operations against one home directory.
pub struct Installer<'a, C: InstanceControl> {
    config: &'a InstallerConfig,
    registry: RegistryStore,
    resolver: TemplateResolver,
    catalog: EngineCatalog,
    control: C,
}

impl<'a, C: InstanceControl> Installer<'a, C> {
    pub fn new(config: &'a InstallerConfig, control: C) -> Self {
        let catalog = EngineCatalog::new(config.engines_dir());
        let resolver = TemplateResolver::new(
            config.depot_layout(),
            config.release_manifest_path(),
            config.depot_dir(),
            catalog.clone(),
        );
        Self {
            config,
            registry: RegistryStore::new(config.registry_path()),
            resolver,
            catalog,
            control,
        }
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn execute(&self, op: Operation) -> Result<InstallReport> {
        let mut tracker = PhaseTracker::new(op.name());
        tracker.advance(InstallPhase::Validating);

        let result = match &op {
            Operation::CreateWeb(p) => self.create_web(&op, p, &mut tracker),
            Operation::CreateWas(p) => self.create_was(&op, p, &mut tracker),
            Operation::CreateSession(p) => self.create_session(&op, p, &mut tracker),
            Operation::CloneWeb(p) | Operation::CloneWas(p) => self.clone_server(&op, p, &mut tracker),
            Operation::Delete(p) => self.delete(&op, p, &mut tracker),
            Operation::ModifyEngine(p) => self.modify_engine(&op, p, &mut tracker),
        };

        match result {
            Ok(report) => {
                tracker.advance(InstallPhase::Done);
                Ok(report)
            }
            Err(e) => {
                tracker.fail(&e);
                Err(e)
            }
        }
    }
}

fn require_server_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(InstallerError::validation("SERVER_ID is required"));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(InstallerError::validation(format!(
            "SERVER_ID '{id}' must not contain path separators"
        )));
    }
    Ok(id)
}

fn require_numeric_port(port: &str) -> Result<()> {
    if is_numeric(port) {
        Ok(())
    } else {
        Err(InstallerError::validation(format!(
            "Service Port should be numeric, got '{port}'"
        )))
    }
}

fn require_type(expected: ServerType, actual: ServerType, id: &str) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(InstallerError::validation(format!(
            "Server type mismatch: '{id}' is a {actual} server, not {expected}"
        )))
    }
}

fn require_absent_path(target: &Path) -> Result<()> {
    if target.exists() {
        return Err(InstallerError::conflict(format!(
            "{} already exists.",
            target.display()
        )));
    }
    Ok(())
}

/// `LOG_HOME` value for a custom log root, scoped per instance.
fn custom_log_home(log_home: Option<&str>, target: &Path) -> Option<String> {
    let log_home = log_home?;
    let default = target.join("logs");
    if Path::new(log_home) == default {
        return None;
    }
    Some(format!("{}/${{SERVER_ID}}", log_home.trim_end_matches('/')))
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
